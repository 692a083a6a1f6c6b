// Service descriptors and the ordered set of services a Localstack instance enables

use crate::errors::{LocalstackError, Result};
use std::fmt;
use std::str::FromStr;

/// The single port Localstack serves every emulated service on
pub const EDGE_PORT: u16 = 4566;

/// Transport protocol of the edge port
pub const EDGE_PROTOCOL: &str = "tcp";

/// Every service name Localstack can be asked to enable
pub const AVAILABLE_SERVICES: &[&str] = &[
    "apigateway",
    "kinesis",
    "dynamodb",
    "dynamodbstreams",
    "es",
    "s3",
    "firehose",
    "lambda",
    "sns",
    "sqs",
    "redshift",
    "ses",
    "route53",
    "cloudformation",
    "cloudwatch",
    "ssm",
    "secretsmanager",
    "stepfunctions",
    "logs",
    "sts",
    "iam",
];

/// One AWS service requested from a Localstack instance.
///
/// Construct through [`Service::new`] so the name is checked against
/// [`AVAILABLE_SERVICES`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Service {
    name: String,
    protocol: String,
    port: u16,
}

impl Service {
    /// Create a service descriptor, rejecting names Localstack does not emulate
    pub fn new(name: &str) -> Result<Self> {
        if !AVAILABLE_SERVICES.contains(&name) {
            return Err(LocalstackError::InvalidService(name.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            protocol: EDGE_PROTOCOL.to_string(),
            port: EDGE_PORT,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Port key as Docker reports it, e.g. `4566/tcp`
    pub fn port_protocol(&self) -> String {
        format!("{}/{}", self.port, self.protocol)
    }

    /// Entry for the `SERVICES` variable, e.g. `s3:4566`
    pub fn name_port(&self) -> String {
        format!("{}:{}", self.name, self.port)
    }
}

impl FromStr for Service {
    type Err = LocalstackError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Service::new(s.trim())
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Ordered collection of services.
///
/// Order decides the sequence in which readiness is polled. Duplicate names
/// are not rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSet {
    services: Vec<Service>,
}

impl ServiceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from service names, failing on the first unknown name
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| Service::new(name.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map(|services| Self { services })
    }

    /// Parse a `SERVICES` value such as `sqs:4566,s3:4566`.
    ///
    /// Ports are ignored; entries without one are taken as bare names.
    pub fn from_enablement_string(value: &str) -> Result<Self> {
        Self::from_names(
            value
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(|entry| entry.split_once(':').map_or(entry, |(name, _)| name)),
        )
    }

    pub fn push(&mut self, service: Service) {
        self.services.push(service);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Service> {
        self.services.iter()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Comma-joined `name:port` pairs in set order, passed to the container as `SERVICES`
    pub fn enablement_string(&self) -> String {
        self.services
            .iter()
            .map(Service::name_port)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.iter().any(|service| service.name == name)
    }

    /// Sort by service name in place
    pub fn sort_by_name(&mut self) -> &mut Self {
        self.services.sort_by(|a, b| a.name.cmp(&b.name));
        self
    }
}

impl FromIterator<Service> for ServiceSet {
    fn from_iter<T: IntoIterator<Item = Service>>(iter: T) -> Self {
        Self {
            services: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ServiceSet {
    type Item = &'a Service;
    type IntoIter = std::slice::Iter<'a, Service>;

    fn into_iter(self) -> Self::IntoIter {
        self.services.iter()
    }
}

impl fmt::Display for ServiceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.enablement_string())
    }
}
