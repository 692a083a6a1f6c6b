//! Container runtime adapter.
//!
//! The lifecycle controller only talks to the container engine through
//! [`ContainerRuntime`]. [`docker::DockerCli`] drives the real `docker` CLI;
//! [`scripted::ScriptedRuntime`] replays canned responses so the controller's
//! branching can be tested without an engine.

pub mod docker;
pub mod retry;
pub mod scripted;

use crate::errors::Result;
use serde::Deserialize;
use std::collections::HashMap;

pub use docker::DockerCli;
pub use retry::{Backoff, RetryPolicy};
pub use scripted::{RetryOutcome, ScriptedRuntime};

/// A container as it appears in a listing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContainerSummary {
    pub id: String,
    /// Image reference the container was created from, e.g. `localstack/localstack:latest`
    pub image: String,
    /// Names in engine API form, each prefixed with `/`
    pub names: Vec<String>,
}

/// One host-side binding of a container port
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct PortBinding {
    #[serde(rename = "HostIp", default)]
    pub host_ip: String,
    #[serde(rename = "HostPort", default)]
    pub host_port: String,
}

impl PortBinding {
    /// `host:port` suitable for building a URL. IPv6 hosts are bracketed.
    pub fn host_port(&self) -> String {
        if self.host_ip.is_empty() {
            format!("localhost:{}", self.host_port)
        } else if self.host_ip.contains(':') {
            format!("[{}]:{}", self.host_ip, self.host_port)
        } else {
            format!("{}:{}", self.host_ip, self.host_port)
        }
    }
}

/// A container as returned by inspection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContainerDetails {
    pub id: String,
    pub name: String,
    pub image: String,
    /// Environment the container was created with, as `KEY=value`
    pub env: Vec<String>,
    /// Published ports keyed by `port/protocol`
    pub ports: HashMap<String, Vec<PortBinding>>,
}

impl ContainerDetails {
    /// `host:port` of the first binding published for `port_protocol`
    pub fn host_port(&self, port_protocol: &str) -> Option<String> {
        self.ports
            .get(port_protocol)
            .and_then(|bindings| bindings.first())
            .map(PortBinding::host_port)
    }

    /// Value of environment variable `key`, if the container was created with it
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env.iter().find_map(|entry| {
            entry
                .split_once('=')
                .filter(|(name, _)| *name == key)
                .map(|(_, value)| value)
        })
    }
}

/// What to start when no existing container can be reused
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunOptions {
    pub repository: String,
    pub tag: String,
    /// Container name; `None` lets the engine pick one
    pub name: Option<String>,
    /// `KEY=value` pairs
    pub env: Vec<String>,
    /// `host_path:container_path` bind mounts
    pub mounts: Vec<String>,
}

impl RunOptions {
    pub fn image(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }
}

/// Operations the lifecycle controller needs from a container engine
pub trait ContainerRuntime: Send + Sync {
    /// List containers; `all` includes stopped ones
    fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>>;

    fn inspect_container(&self, id: &str) -> Result<ContainerDetails>;

    /// Create and start a container, returning its inspected state
    fn run_with_options(&self, options: &RunOptions) -> Result<ContainerDetails>;

    /// Combined stdout and stderr the container has written so far
    fn logs(&self, id: &str) -> Result<String>;

    /// Check that the engine is reachable
    fn ping(&self) -> Result<()>;

    /// Force-remove a container along with its volumes.
    ///
    /// A container that is already gone counts as purged.
    fn purge(&self, id: &str) -> Result<()>;

    /// Call `check` until it succeeds or the retry budget runs out.
    ///
    /// On exhaustion returns [`crate::errors::LocalstackError::RetryExhausted`].
    fn retry(&self, check: &mut dyn FnMut() -> Result<()>) -> Result<()>;
}
