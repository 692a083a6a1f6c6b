// Localstack container lifecycle: discover or start the container, wait for it, tear it down

use crate::config::Config;
use crate::endpoint::{LocalstackResolver, ResolverMode};
use crate::errors::{LocalstackError, Result};
use crate::runtime::{ContainerDetails, ContainerRuntime, DockerCli, RunOptions};
use crate::service::{ServiceSet, EDGE_PORT, EDGE_PROTOCOL};
use crate::session::SessionConfig;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Docker repository of the Localstack image
pub const LOCALSTACK_REPOSITORY: &str = "localstack/localstack";

/// Last Localstack release this crate was tested against
pub const LOCALSTACK_TAG: &str = "0.11.5";

/// Tag used by the unpinned constructors
pub const LOCALSTACK_TAG_LATEST: &str = "latest";

/// Host directory bind-mounted when persistence is requested
pub const HOST_DATA_PATH: &str = "/tmp/localstack/data";

/// Where Localstack expects persisted data inside the container
pub const CONTAINER_DATA_PATH: &str = "/tmp/localstack/data";

/// Log text Localstack prints once every requested service is up
pub const READY_MARKER: &str = "Ready.";

/// Environment variable carrying the enabled services into the container
pub const SERVICES_ENV: &str = "SERVICES";

/// Which container to reuse or start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Reuse a container with this name if one exists; `None` always starts a fresh one
    pub name: Option<String>,
    pub repository: String,
    pub tag: String,
    /// Value for Localstack's `DATA_DIR`; enables persistence
    pub data_dir: Option<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            name: None,
            repository: LOCALSTACK_REPOSITORY.to_string(),
            tag: LOCALSTACK_TAG_LATEST.to_string(),
            data_dir: None,
        }
    }
}

impl LaunchOptions {
    pub fn image(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }

    fn run_options(&self, services: &ServiceSet) -> RunOptions {
        let mut options = RunOptions {
            repository: self.repository.clone(),
            tag: self.tag.clone(),
            name: self.name.clone().filter(|n| !n.is_empty()),
            env: vec![format!("{}={}", SERVICES_ENV, services.enablement_string())],
            mounts: Vec::new(),
        };

        if let Some(data_dir) = self.data_dir.as_deref().filter(|d| !d.is_empty()) {
            options.env.push(format!("DATA_DIR={}", data_dir));
            options
                .mounts
                .push(format!("{}:{}", HOST_DATA_PATH, CONTAINER_DATA_PATH));
        }

        options
    }
}

/// A running, ready Localstack container.
///
/// There is no `Drop` cleanup: call [`Localstack::destroy`] explicitly. Test
/// harnesses typically finish with `std::process::exit`, which skips
/// destructors anyway.
pub struct Localstack {
    container: ContainerDetails,
    services: Arc<ServiceSet>,
    runtime: Arc<dyn ContainerRuntime>,
    resolver_mode: ResolverMode,
}

impl Localstack {
    /// Start Localstack from `localstack/localstack:latest`
    pub fn new(services: impl Into<Arc<ServiceSet>>) -> Result<Self> {
        Self::launch(
            services.into(),
            Arc::new(DockerCli::new()),
            &LaunchOptions::default(),
        )
    }

    /// Start Localstack with persistence enabled under `data_dir`
    pub fn new_persistent(services: impl Into<Arc<ServiceSet>>, data_dir: &str) -> Result<Self> {
        Self::new_persistent_specific(
            services,
            "",
            LOCALSTACK_REPOSITORY,
            LOCALSTACK_TAG_LATEST,
            data_dir,
        )
    }

    /// Reuse or start a persistent container called `name`
    pub fn new_named_persistent(
        services: impl Into<Arc<ServiceSet>>,
        name: &str,
        data_dir: &str,
    ) -> Result<Self> {
        Self::new_persistent_specific(
            services,
            name,
            LOCALSTACK_REPOSITORY,
            LOCALSTACK_TAG_LATEST,
            data_dir,
        )
    }

    /// Reuse or start a container from a specific image.
    ///
    /// The image must be a Localstack image; anything else will never print
    /// the readiness marker. An empty `name` always starts a new container.
    pub fn new_specific(
        services: impl Into<Arc<ServiceSet>>,
        name: &str,
        repository: &str,
        tag: &str,
    ) -> Result<Self> {
        Self::new_persistent_specific(services, name, repository, tag, "")
    }

    pub fn new_persistent_specific(
        services: impl Into<Arc<ServiceSet>>,
        name: &str,
        repository: &str,
        tag: &str,
        data_dir: &str,
    ) -> Result<Self> {
        let options = LaunchOptions {
            name: Some(name.to_string()).filter(|n| !n.is_empty()),
            repository: repository.to_string(),
            tag: tag.to_string(),
            data_dir: Some(data_dir.to_string()).filter(|d| !d.is_empty()),
        };
        Self::launch(services.into(), Arc::new(DockerCli::new()), &options)
    }

    /// Start Localstack as described by a loaded [`Config`]
    pub fn from_config(services: impl Into<Arc<ServiceSet>>, config: &Config) -> Result<Self> {
        let runtime = DockerCli::new().with_retry_policy(config.retry_policy());
        let localstack =
            Self::launch(services.into(), Arc::new(runtime), &config.launch_options())?;
        Ok(localstack.with_resolver_mode(config.resolver))
    }

    /// Discover or start the container through `runtime`, then block until
    /// every service in `services` is ready.
    ///
    /// Fails fast: the first service that never becomes ready aborts the
    /// launch and later services are not polled.
    pub fn launch(
        services: Arc<ServiceSet>,
        runtime: Arc<dyn ContainerRuntime>,
        options: &LaunchOptions,
    ) -> Result<Self> {
        let container = match find_existing(
            runtime.as_ref(),
            options.name.as_deref(),
            &options.repository,
            &options.tag,
        )? {
            Some(container) => {
                info!(
                    container = %container.id,
                    image = %options.image(),
                    "reusing existing Localstack container"
                );
                container
            }
            None => {
                let run_options = options.run_options(&services);
                info!(
                    image = %run_options.image(),
                    services = %services,
                    "starting Localstack container"
                );
                runtime
                    .run_with_options(&run_options)
                    .map_err(|e| LocalstackError::ResourceStart(Box::new(e)))?
            }
        };

        for service in services.iter() {
            debug!(service = %service, container = %container.id, "waiting for service");
            runtime
                .retry(&mut || check_ready(runtime.as_ref(), &container.id))
                .map_err(|e| LocalstackError::ServiceUnavailable {
                    service: service.name().to_string(),
                    source: Box::new(e),
                })?;
        }

        info!(container = %container.id, "Localstack is ready");
        Ok(Self {
            container,
            services,
            runtime,
            resolver_mode: ResolverMode::default(),
        })
    }

    /// Choose how the resolver treats known services that were not enabled
    pub fn with_resolver_mode(mut self, mode: ResolverMode) -> Self {
        self.resolver_mode = mode;
        self
    }

    pub fn container(&self) -> &ContainerDetails {
        &self.container
    }

    pub fn services(&self) -> &Arc<ServiceSet> {
        &self.services
    }

    /// Published `host:port` of the edge port
    pub fn host_port(&self) -> Option<String> {
        self.container
            .host_port(&format!("{}/{}", EDGE_PORT, EDGE_PROTOCOL))
    }

    pub fn endpoint_url(&self) -> Option<String> {
        self.host_port().map(|hp| format!("http://{}", hp))
    }

    /// Resolver routing this instance's enabled services to the container
    pub fn resolver(&self) -> LocalstackResolver {
        LocalstackResolver::new(self.host_port(), Arc::clone(&self.services))
            .with_mode(self.resolver_mode)
    }

    /// SDK configuration that sends traffic for enabled services to this container
    pub fn create_session_config(&self) -> SessionConfig {
        SessionConfig::new(Arc::new(self.resolver()))
    }

    /// Remove the container. Safe to call more than once; never retried.
    pub fn destroy(&self) -> Result<()> {
        purge_container(self.runtime.as_ref(), &self.container.id)
    }
}

impl fmt::Debug for Localstack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Localstack")
            .field("container", &self.container)
            .field("services", &self.services)
            .field("resolver_mode", &self.resolver_mode)
            .finish_non_exhaustive()
    }
}

/// Look for a container named `name` created from `repository:tag`.
///
/// Returns `Ok(None)` without querying the runtime when no name is given.
/// The first listed container with an exact image match and the name wins.
pub fn find_existing(
    runtime: &dyn ContainerRuntime,
    name: Option<&str>,
    repository: &str,
    tag: &str,
) -> Result<Option<ContainerDetails>> {
    let name = match name.filter(|n| !n.is_empty()) {
        Some(name) => name,
        None => return Ok(None),
    };

    let containers = runtime
        .list_containers(true)
        .map_err(|e| LocalstackError::runtime_query("unable to retrieve docker containers", e))?;

    let image = format!("{}:{}", repository, tag);
    let wanted = format!("/{}", name);

    let found = containers
        .iter()
        .filter(|c| c.image == image)
        .find(|c| c.names.iter().any(|n| *n == wanted));

    match found {
        Some(summary) => {
            let details = runtime.inspect_container(&summary.id).map_err(|e| {
                LocalstackError::runtime_query(
                    format!("unable to inspect container {}", summary.id),
                    e,
                )
            })?;
            Ok(Some(details))
        }
        None => Ok(None),
    }
}

/// Services a container was started with, read back from its `SERVICES` env.
///
/// `Ok(None)` when the container carries no such variable.
pub fn enabled_services(container: &ContainerDetails) -> Result<Option<ServiceSet>> {
    container
        .env_value(SERVICES_ENV)
        .map(ServiceSet::from_enablement_string)
        .transpose()
}

/// Check the engine is reachable, then force-remove container `id`
pub fn purge_container(runtime: &dyn ContainerRuntime, id: &str) -> Result<()> {
    runtime
        .ping()
        .map_err(|e| LocalstackError::teardown("could not connect to docker", e))?;

    runtime
        .purge(id)
        .map_err(|e| LocalstackError::teardown("could not purge resource", e))?;

    info!(container = %id, "Localstack container removed");
    Ok(())
}

/// True once any log line contains the readiness marker
pub fn log_reports_ready(logs: &str) -> bool {
    logs.lines().any(|line| line.trim().contains(READY_MARKER))
}

/// One readiness check: fetch the full log and scan it
fn check_ready(runtime: &dyn ContainerRuntime, container_id: &str) -> Result<()> {
    let logs = runtime.logs(container_id)?;
    if log_reports_ready(&logs) {
        Ok(())
    } else {
        Err(LocalstackError::NotReady)
    }
}
