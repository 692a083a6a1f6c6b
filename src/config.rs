use crate::endpoint::ResolverMode;
use crate::errors::{LocalstackError, Result};
use crate::localstack::{LaunchOptions, LOCALSTACK_REPOSITORY, LOCALSTACK_TAG_LATEST};
use crate::runtime::{Backoff, RetryPolicy};
use crate::service::ServiceSet;
use serde::{Deserialize, Deserializer, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Project-level config file, looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = ".localstack.yml";

const USER_CONFIG_DIR: &str = "localstack-harness";
const USER_CONFIG_FILE: &str = "config.yml";

pub const ENV_REPOSITORY: &str = "LOCALSTACK_REPOSITORY";
pub const ENV_TAG: &str = "LOCALSTACK_TAG";
pub const ENV_CONTAINER_NAME: &str = "LOCALSTACK_CONTAINER_NAME";
pub const ENV_DATA_DIR: &str = "LOCALSTACK_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub repository: String,
    pub tag: String,
    pub name: Option<String>,
    pub data_dir: Option<String>,
    /// Services the CLI enables when `--services` is not given
    pub services: Vec<String>,
    pub resolver: ResolverMode,
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository: LOCALSTACK_REPOSITORY.to_string(),
            tag: LOCALSTACK_TAG_LATEST.to_string(),
            name: None,
            data_dir: None,
            services: Vec::new(),
            resolver: ResolverMode::default(),
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    Fixed,
    Exponential,
}

/// Readiness polling budget as written in config files
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetryConfig {
    pub backoff: BackoffKind,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub multiplier: f64,
    pub max_attempts: Option<u32>,
    pub max_elapsed_secs: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff: BackoffKind::Exponential,
            initial_interval_ms: 500,
            max_interval_ms: 60_000,
            multiplier: 1.5,
            max_attempts: None,
            max_elapsed_secs: Some(60),
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        let initial = Duration::from_millis(self.initial_interval_ms);
        let backoff = match self.backoff {
            BackoffKind::Fixed => Backoff::Fixed(initial),
            BackoffKind::Exponential => Backoff::Exponential {
                initial,
                multiplier: self.multiplier,
                max_interval: Duration::from_millis(self.max_interval_ms),
            },
        };

        RetryPolicy {
            backoff,
            max_attempts: self.max_attempts,
            max_elapsed: self.max_elapsed_secs.map(Duration::from_secs),
        }
    }
}

/// One config file; absent keys leave the lower layer untouched
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigLayer {
    repository: Option<String>,
    tag: Option<String>,
    name: Option<String>,
    data_dir: Option<String>,
    services: Option<Vec<String>>,
    resolver: Option<ResolverMode>,
    #[serde(default)]
    retry: RetryLayer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RetryLayer {
    backoff: Option<BackoffKind>,
    initial_interval_ms: Option<u64>,
    max_interval_ms: Option<u64>,
    multiplier: Option<f64>,
    /// Outer `None` leaves the lower layer alone; `Some(None)` is an explicit `null`
    #[serde(default, deserialize_with = "nullable")]
    max_attempts: Option<Option<u32>>,
    #[serde(default, deserialize_with = "nullable")]
    max_elapsed_secs: Option<Option<u64>>,
}

/// Keep a present-but-null key distinct from a missing one
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl Config {
    /// Load defaults, then the user config, then `.localstack.yml` in `dir`,
    /// then environment overrides
    pub fn load(dir: &Path) -> Result<Self> {
        let user_file = Self::user_config_path();
        let mut config = Self::load_files(user_file.as_deref(), dir)?;
        config.apply_env();
        Ok(config)
    }

    /// Merge the given user file (if any) and the project file in `dir`, without env overrides
    pub fn load_files(user_file: Option<&Path>, dir: &Path) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = user_file {
            if let Some(layer) = Self::read_layer(path)? {
                config.merge(layer);
            }
        }

        if let Some(layer) = Self::read_layer(&dir.join(PROJECT_CONFIG_FILE))? {
            config.merge(layer);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE))
    }

    fn read_layer(path: &Path) -> Result<Option<ConfigLayer>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Some(ConfigLayer::default()));
        }

        let layer = serde_yml::from_str(&content).map_err(|e| {
            LocalstackError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Ok(Some(layer))
    }

    fn merge(&mut self, layer: ConfigLayer) {
        if let Some(repository) = layer.repository {
            self.repository = repository;
        }
        if let Some(tag) = layer.tag {
            self.tag = tag;
        }
        if layer.name.is_some() {
            self.name = layer.name;
        }
        if layer.data_dir.is_some() {
            self.data_dir = layer.data_dir;
        }
        if let Some(services) = layer.services {
            self.services = services;
        }
        if let Some(resolver) = layer.resolver {
            self.resolver = resolver;
        }

        let retry = layer.retry;
        if let Some(backoff) = retry.backoff {
            self.retry.backoff = backoff;
        }
        if let Some(ms) = retry.initial_interval_ms {
            self.retry.initial_interval_ms = ms;
        }
        if let Some(ms) = retry.max_interval_ms {
            self.retry.max_interval_ms = ms;
        }
        if let Some(multiplier) = retry.multiplier {
            self.retry.multiplier = multiplier;
        }
        if let Some(max_attempts) = retry.max_attempts {
            self.retry.max_attempts = max_attempts;
        }
        if let Some(max_elapsed_secs) = retry.max_elapsed_secs {
            self.retry.max_elapsed_secs = max_elapsed_secs;
        }
    }

    fn apply_env(&mut self) {
        if let Some(repository) = non_empty_env(ENV_REPOSITORY) {
            self.repository = repository;
        }
        if let Some(tag) = non_empty_env(ENV_TAG) {
            self.tag = tag;
        }
        if let Some(name) = non_empty_env(ENV_CONTAINER_NAME) {
            self.name = Some(name);
        }
        if let Some(data_dir) = non_empty_env(ENV_DATA_DIR) {
            self.data_dir = Some(data_dir);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.repository.trim().is_empty() {
            return Err(LocalstackError::ConfigError(
                "repository must not be empty".to_string(),
            ));
        }
        if self.tag.trim().is_empty() {
            return Err(LocalstackError::ConfigError("tag must not be empty".to_string()));
        }
        if self.retry.max_attempts == Some(0) {
            return Err(LocalstackError::ConfigError(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.max_elapsed_secs == Some(0) {
            return Err(LocalstackError::ConfigError(
                "retry.max_elapsed_secs must be at least 1".to_string(),
            ));
        }
        if self.retry.max_attempts.is_none() && self.retry.max_elapsed_secs.is_none() {
            return Err(LocalstackError::ConfigError(
                "retry needs max_attempts or max_elapsed_secs".to_string(),
            ));
        }
        if !(self.retry.multiplier >= 1.0 && self.retry.multiplier.is_finite()) {
            return Err(LocalstackError::ConfigError(format!(
                "retry.multiplier must be at least 1.0, got {}",
                self.retry.multiplier
            )));
        }
        Ok(())
    }

    /// The configured default services as a validated set
    pub fn service_set(&self) -> Result<ServiceSet> {
        ServiceSet::from_names(&self.services)
    }

    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            name: self.name.clone(),
            repository: self.repository.clone(),
            tag: self.tag.clone(),
            data_dir: self.data_dir.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.to_policy()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
