// Container runtime backed by the docker CLI
// Every call spawns `docker` with explicit arguments, no shell involved

use super::retry::{retry_with, RetryPolicy};
use super::{ContainerDetails, ContainerRuntime, ContainerSummary, PortBinding, RunOptions};
use crate::clock::{Clock, SystemClock};
use crate::errors::{LocalstackError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::process::Command;
use std::sync::Arc;
use tracing::debug;

/// Line of `docker ps --format '{{json .}}'`
#[derive(Debug, Deserialize)]
struct PsLine {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Image")]
    image: String,
    /// Comma separated, without the leading `/`
    #[serde(rename = "Names", default)]
    names: String,
}

/// The parts of `docker inspect` output the harness reads
#[derive(Debug, Deserialize)]
struct InspectEntry {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Config", default)]
    config: Option<InspectConfig>,
    #[serde(rename = "NetworkSettings", default)]
    network_settings: Option<InspectNetwork>,
}

#[derive(Debug, Deserialize)]
struct InspectConfig {
    #[serde(rename = "Image", default)]
    image: String,
    #[serde(rename = "Env", default)]
    env: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct InspectNetwork {
    #[serde(rename = "Ports", default)]
    ports: Option<HashMap<String, Option<Vec<PortBinding>>>>,
}

/// Talks to the local container engine through the `docker` binary
pub struct DockerCli {
    program: String,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerCli {
    pub fn new() -> Self {
        Self {
            program: "docker".to_string(),
            policy: RetryPolicy::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use a different retry budget for readiness polling
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use a docker-compatible binary other than `docker` (e.g. `podman`)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run the binary and return stdout, mapping a non-zero exit to `Docker(stderr)`
    fn execute(&self, args: &[String]) -> Result<String> {
        debug!(program = %self.program, ?args, "running container command");
        let output = Command::new(&self.program).args(args).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LocalstackError::Docker(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Arguments for `docker ps`
fn build_list_args(all: bool) -> Vec<String> {
    let mut args = vec!["ps".to_string()];
    if all {
        args.push("-a".to_string());
    }
    args.push("--no-trunc".to_string());
    args.push("--format".to_string());
    args.push("{{json .}}".to_string());
    args
}

/// Arguments for `docker run`; `-P` publishes the image's exposed ports on random host ports
fn build_run_args(options: &RunOptions) -> Vec<String> {
    let mut args = vec!["run".to_string(), "-d".to_string(), "-P".to_string()];

    if let Some(name) = options.name.as_deref().filter(|n| !n.is_empty()) {
        args.push("--name".to_string());
        args.push(name.to_string());
    }

    for var in &options.env {
        args.push("-e".to_string());
        args.push(var.clone());
    }

    for mount in &options.mounts {
        args.push("-v".to_string());
        args.push(mount.clone());
    }

    args.push(options.image());
    args
}

fn parse_ps_output(output: &str) -> Result<Vec<ContainerSummary>> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let entry: PsLine = serde_json::from_str(line)?;
            Ok(ContainerSummary {
                id: entry.id,
                image: entry.image,
                names: entry
                    .names
                    .split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(|n| format!("/{}", n.trim_start_matches('/')))
                    .collect(),
            })
        })
        .collect()
}

fn parse_inspect_output(output: &str) -> Result<ContainerDetails> {
    let entries: Vec<InspectEntry> = serde_json::from_str(output)?;
    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| LocalstackError::Docker("inspect returned no containers".to_string()))?;

    let ports = entry
        .network_settings
        .and_then(|n| n.ports)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(port, bindings)| bindings.map(|b| (port, b)))
        .collect();

    let (image, env) = entry
        .config
        .map(|c| (c.image, c.env.unwrap_or_default()))
        .unwrap_or_default();

    Ok(ContainerDetails {
        id: entry.id,
        name: entry.name,
        image,
        env,
        ports,
    })
}

impl ContainerRuntime for DockerCli {
    fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>> {
        let output = self.execute(&build_list_args(all))?;
        parse_ps_output(&output)
    }

    fn inspect_container(&self, id: &str) -> Result<ContainerDetails> {
        let args = vec![
            "inspect".to_string(),
            "--type".to_string(),
            "container".to_string(),
            id.to_string(),
        ];
        let output = self.execute(&args)?;
        parse_inspect_output(&output)
    }

    fn run_with_options(&self, options: &RunOptions) -> Result<ContainerDetails> {
        let output = self.execute(&build_run_args(options))?;
        let id = output.trim();
        if id.is_empty() {
            return Err(LocalstackError::Docker(
                "run did not report a container id".to_string(),
            ));
        }
        self.inspect_container(id)
    }

    fn logs(&self, id: &str) -> Result<String> {
        debug!(container = id, "fetching container logs");
        let output = Command::new(&self.program)
            .args(["logs", id])
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LocalstackError::Docker(format!(
                "unable to retrieve logs for container {}: {}",
                id,
                stderr.trim()
            )));
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(combined)
    }

    fn ping(&self) -> Result<()> {
        let args = vec![
            "version".to_string(),
            "--format".to_string(),
            "{{.Server.Version}}".to_string(),
        ];
        self.execute(&args).map(|_| ())
    }

    fn purge(&self, id: &str) -> Result<()> {
        let args = vec!["rm".to_string(), "-f".to_string(), "-v".to_string(), id.to_string()];
        match self.execute(&args) {
            Ok(_) => Ok(()),
            Err(LocalstackError::Docker(stderr)) if stderr.contains("No such container") => {
                debug!(container = id, "container already removed");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn retry(&self, check: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        retry_with(&self.policy, self.clock.as_ref(), check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_list_args() {
        assert_eq!(
            build_list_args(true),
            vec!["ps", "-a", "--no-trunc", "--format", "{{json .}}"]
        );
        assert!(!build_list_args(false).contains(&"-a".to_string()));
    }

    #[test]
    fn test_build_run_args_minimal() {
        let options = RunOptions {
            repository: "localstack/localstack".to_string(),
            tag: "latest".to_string(),
            name: None,
            env: vec!["SERVICES=s3:4566".to_string()],
            mounts: vec![],
        };

        let args = build_run_args(&options);
        assert_eq!(
            args,
            vec![
                "run",
                "-d",
                "-P",
                "-e",
                "SERVICES=s3:4566",
                "localstack/localstack:latest"
            ]
        );
    }

    #[test]
    fn test_build_run_args_named_with_mount() {
        let options = RunOptions {
            repository: "localstack/localstack".to_string(),
            tag: "0.11.5".to_string(),
            name: Some("ls-test".to_string()),
            env: vec![
                "SERVICES=s3:4566".to_string(),
                "DATA_DIR=/tmp/localstack/data".to_string(),
            ],
            mounts: vec!["/tmp/localstack/data:/tmp/localstack/data".to_string()],
        };

        let args = build_run_args(&options);
        let joined = args.join(" ");
        assert!(joined.contains("--name ls-test"));
        assert!(joined.contains("-e DATA_DIR=/tmp/localstack/data"));
        assert!(joined.contains("-v /tmp/localstack/data:/tmp/localstack/data"));
        assert_eq!(args.last().unwrap(), "localstack/localstack:0.11.5");
    }

    #[test]
    fn test_build_run_args_ignores_empty_name() {
        let options = RunOptions {
            repository: "r".to_string(),
            tag: "t".to_string(),
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(!build_run_args(&options).contains(&"--name".to_string()));
    }

    #[test]
    fn test_parse_ps_output_normalises_names() {
        let output = r#"{"Command":"\"docker-entrypoint.sh\"","ID":"abc123","Image":"localstack/localstack:latest","Names":"ls-test","State":"running"}
{"ID":"def456","Image":"postgres:16","Names":"db,db-alias"}
"#;
        let containers = parse_ps_output(output).unwrap();
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0].id, "abc123");
        assert_eq!(containers[0].image, "localstack/localstack:latest");
        assert_eq!(containers[0].names, vec!["/ls-test"]);
        assert_eq!(containers[1].names, vec!["/db", "/db-alias"]);
    }

    #[test]
    fn test_parse_ps_output_empty() {
        assert!(parse_ps_output("\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_inspect_output() {
        let output = r#"[{
            "Id": "abc123",
            "Name": "/ls-test",
            "Config": {"Image": "localstack/localstack:latest", "Env": ["SERVICES=s3:4566"]},
            "NetworkSettings": {
                "Ports": {
                    "4566/tcp": [{"HostIp": "0.0.0.0", "HostPort": "49153"}],
                    "4571/tcp": null
                }
            }
        }]"#;

        let details = parse_inspect_output(output).unwrap();
        assert_eq!(details.id, "abc123");
        assert_eq!(details.name, "/ls-test");
        assert_eq!(details.image, "localstack/localstack:latest");
        assert_eq!(details.env, vec!["SERVICES=s3:4566"]);
        assert_eq!(details.host_port("4566/tcp"), Some("0.0.0.0:49153".to_string()));
        assert!(!details.ports.contains_key("4571/tcp"));
    }

    #[test]
    fn test_parse_inspect_output_empty_array() {
        assert!(matches!(
            parse_inspect_output("[]"),
            Err(LocalstackError::Docker(_))
        ));
    }

    #[test]
    fn test_builder_overrides() {
        let policy = RetryPolicy::fixed(std::time::Duration::from_secs(1), 2);
        let cli = DockerCli::new()
            .with_program("podman")
            .with_retry_policy(policy.clone());
        assert_eq!(cli.program, "podman");
        assert_eq!(cli.retry_policy(), &policy);
    }
}
