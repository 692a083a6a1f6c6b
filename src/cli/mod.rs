// Command implementations for the `lsh` binary

pub mod resolve;
pub mod services;
pub mod start;
pub mod stop;

use crate::config::Config;
use crate::errors::{LocalstackError, Result};
use crate::service::ServiceSet;

/// Command-line values that take precedence over config files and env
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub services: Option<Vec<String>>,
    pub name: Option<String>,
    pub repository: Option<String>,
    pub tag: Option<String>,
    pub data_dir: Option<String>,
}

impl Overrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(services) = &self.services {
            config.services = services.clone();
        }
        if self.name.is_some() {
            config.name = self.name.clone();
        }
        if let Some(repository) = &self.repository {
            config.repository = repository.clone();
        }
        if let Some(tag) = &self.tag {
            config.tag = tag.clone();
        }
        if self.data_dir.is_some() {
            config.data_dir = self.data_dir.clone();
        }
    }
}

/// Services from config, refusing to run with none
fn requested_services(config: &Config) -> Result<ServiceSet> {
    let services = config.service_set()?;
    if services.is_empty() {
        return Err(LocalstackError::ConfigError(
            "No services requested. Pass --services or set `services` in .localstack.yml".to_string(),
        ));
    }
    Ok(services)
}

/// Container name from config, required by commands that attach to a running container
fn required_name(config: &Config) -> Result<String> {
    config
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            LocalstackError::ConfigError(
                "A container name is required. Pass --name or set `name` in .localstack.yml"
                    .to_string(),
            )
        })
}
