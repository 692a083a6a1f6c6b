use super::{required_name, requested_services, Overrides};
use crate::config::Config;
use crate::endpoint::{EndpointResolver, LocalstackResolver, ResolverMode};
use crate::errors::{LocalstackError, Result};
use crate::localstack::{enabled_services, find_existing};
use crate::runtime::DockerCli;
use crate::service::{EDGE_PORT, EDGE_PROTOCOL};
use crate::session::SESSION_REGION;
use std::env;
use std::sync::Arc;

/// Print the URL an SDK client would use for `sdk_id` against a running container
pub fn run(sdk_id: &str, region: Option<&str>, strict: bool, overrides: &Overrides) -> Result<()> {
    let mut config = Config::load(&env::current_dir()?)?;
    overrides.apply(&mut config);
    let name = required_name(&config)?;

    let runtime = DockerCli::new();
    let container = find_existing(&runtime, Some(&name), &config.repository, &config.tag)?
        .ok_or_else(|| {
            LocalstackError::Docker(format!(
                "no container named '{}' running {}:{}",
                name, config.repository, config.tag
            ))
        })?;

    // The container's own SERVICES wins; config only covers containers started without it
    let services = match enabled_services(&container)? {
        Some(services) => services,
        None => requested_services(&config)?,
    };

    let mode = if strict {
        ResolverMode::Strict
    } else {
        config.resolver
    };
    let resolver = LocalstackResolver::new(
        container.host_port(&format!("{}/{}", EDGE_PORT, EDGE_PROTOCOL)),
        Arc::new(services),
    )
    .with_mode(mode);

    let endpoint = resolver.endpoint_for(sdk_id, region.unwrap_or(SESSION_REGION))?;
    println!("{}", endpoint);
    Ok(())
}
