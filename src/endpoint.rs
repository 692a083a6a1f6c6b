//! Endpoint resolution for SDK clients.
//!
//! SDKs identify services by their endpoint prefix (`monitoring`, `email`,
//! `streams.dynamodb`, ...), which does not always match the name Localstack
//! uses. [`LocalstackResolver`] routes identifiers whose Localstack service
//! is enabled to the container and hands everything else to a fallback,
//! by default [`DefaultResolver`].

use crate::errors::{LocalstackError, Result};
use crate::service::{ServiceSet, EDGE_PORT, EDGE_PROTOCOL};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// SDK endpoint identifier -> Localstack service name
pub const SDK_SERVICE_IDS: &[(&str, &str)] = &[
    ("apigateway", "apigateway"),
    ("kinesis", "kinesis"),
    ("dynamodb", "dynamodb"),
    ("streams.dynamodb", "dynamodbstreams"),
    ("es", "es"),
    ("s3", "s3"),
    ("firehose", "firehose"),
    ("lambda", "lambda"),
    ("sns", "sns"),
    ("sqs", "sqs"),
    ("redshift", "redshift"),
    ("email", "ses"),
    ("route53", "route53"),
    ("cloudformation", "cloudformation"),
    ("monitoring", "cloudwatch"),
    ("ssm", "ssm"),
    ("secretsmanager", "secretsmanager"),
    ("states", "stepfunctions"),
    ("logs", "logs"),
    ("sts", "sts"),
    ("iam", "iam"),
];

/// Services whose default endpoint has no region component
const GLOBAL_SERVICES: &[&str] = &["iam", "route53", "cloudfront"];

/// Localstack service name for an SDK endpoint identifier
pub fn service_name_for(sdk_id: &str) -> Option<&'static str> {
    SDK_SERVICE_IDS
        .iter()
        .find(|(id, _)| *id == sdk_id)
        .map(|(_, name)| *name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub url: String,
}

impl fmt::Display for ResolvedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Maps an SDK service identifier and region to a URL
pub trait EndpointResolver: Send + Sync {
    fn endpoint_for(&self, service: &str, region: &str) -> Result<ResolvedEndpoint>;
}

/// The public AWS endpoint an SDK would use without any override
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResolver;

impl EndpointResolver for DefaultResolver {
    fn endpoint_for(&self, service: &str, region: &str) -> Result<ResolvedEndpoint> {
        if service.is_empty() || region.is_empty() {
            return Err(LocalstackError::UnknownEndpoint {
                service: service.to_string(),
                region: region.to_string(),
            });
        }

        let suffix = if region.starts_with("cn-") {
            "amazonaws.com.cn"
        } else {
            "amazonaws.com"
        };

        let url = if GLOBAL_SERVICES.contains(&service) {
            format!("https://{}.{}", service, suffix)
        } else {
            format!("https://{}.{}.{}", service, region, suffix)
        };

        Ok(ResolvedEndpoint { url })
    }
}

/// What to do with a recognised identifier whose service was not enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverMode {
    /// Hand it to the fallback resolver
    #[default]
    Permissive,
    /// Fail with [`LocalstackError::EndpointNotEnabled`]
    Strict,
}

/// Routes enabled services to a Localstack container
#[derive(Clone)]
pub struct LocalstackResolver {
    host_port: Option<String>,
    services: Arc<ServiceSet>,
    mode: ResolverMode,
    fallback: Arc<dyn EndpointResolver>,
}

impl LocalstackResolver {
    /// `host_port` is the published address of the edge port, if any
    pub fn new(host_port: Option<String>, services: Arc<ServiceSet>) -> Self {
        Self {
            host_port,
            services,
            mode: ResolverMode::default(),
            fallback: Arc::new(DefaultResolver),
        }
    }

    pub fn with_mode(mut self, mode: ResolverMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn EndpointResolver>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn mode(&self) -> ResolverMode {
        self.mode
    }
}

impl fmt::Debug for LocalstackResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalstackResolver")
            .field("host_port", &self.host_port)
            .field("services", &self.services.enablement_string())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl EndpointResolver for LocalstackResolver {
    fn endpoint_for(&self, service: &str, region: &str) -> Result<ResolvedEndpoint> {
        if let Some(name) = service_name_for(service) {
            if self.services.contains(name) {
                let host_port = self.host_port.as_ref().ok_or_else(|| {
                    LocalstackError::PortNotPublished(format!("{}/{}", EDGE_PORT, EDGE_PROTOCOL))
                })?;
                return Ok(ResolvedEndpoint {
                    url: format!("http://{}", host_port),
                });
            }

            if self.mode == ResolverMode::Strict {
                return Err(LocalstackError::EndpointNotEnabled(service.to_string()));
            }

            warn!(
                service,
                localstack_service = name,
                "service not enabled in Localstack, using default endpoint"
            );
        }

        self.fallback.endpoint_for(service, region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(names: &[&str]) -> LocalstackResolver {
        let services = Arc::new(ServiceSet::from_names(names).unwrap());
        LocalstackResolver::new(Some("1.0.0.0:9566".to_string()), services)
    }

    #[test]
    fn test_mapping_targets_are_available_services() {
        for (_, name) in SDK_SERVICE_IDS {
            assert!(
                crate::service::AVAILABLE_SERVICES.contains(name),
                "{} is not an available service",
                name
            );
        }
    }

    #[test]
    fn test_renamed_identifiers() {
        assert_eq!(service_name_for("streams.dynamodb"), Some("dynamodbstreams"));
        assert_eq!(service_name_for("email"), Some("ses"));
        assert_eq!(service_name_for("monitoring"), Some("cloudwatch"));
        assert_eq!(service_name_for("states"), Some("stepfunctions"));
        assert_eq!(service_name_for("ses"), None);
        assert_eq!(service_name_for("ec2"), None);
    }

    #[test]
    fn test_enabled_service_routes_to_container() {
        let resolver = resolver(&["sqs", "cloudwatch"]);
        assert_eq!(
            resolver.endpoint_for("sqs", "us-east-1").unwrap().url,
            "http://1.0.0.0:9566"
        );
        assert_eq!(
            resolver.endpoint_for("monitoring", "eu-west-1").unwrap().url,
            "http://1.0.0.0:9566"
        );
    }

    #[test]
    fn test_disabled_service_falls_back() {
        let resolver = resolver(&["sqs"]);
        assert_eq!(
            resolver.endpoint_for("s3", "us-east-1").unwrap().url,
            "https://s3.us-east-1.amazonaws.com"
        );
        assert_eq!(
            resolver.endpoint_for("ec2", "us-west-2").unwrap().url,
            "https://ec2.us-west-2.amazonaws.com"
        );
    }

    #[test]
    fn test_strict_mode_rejects_disabled_known_service() {
        let resolver = resolver(&["sqs"]).with_mode(ResolverMode::Strict);
        assert!(matches!(
            resolver.endpoint_for("s3", "us-east-1"),
            Err(LocalstackError::EndpointNotEnabled(ref id)) if id == "s3"
        ));
        // Identifiers Localstack does not know still fall through
        assert!(resolver.endpoint_for("ec2", "us-east-1").is_ok());
    }

    #[test]
    fn test_missing_port_binding() {
        let services = Arc::new(ServiceSet::from_names(["s3"]).unwrap());
        let resolver = LocalstackResolver::new(None, services);
        assert!(matches!(
            resolver.endpoint_for("s3", "us-east-1"),
            Err(LocalstackError::PortNotPublished(ref p)) if p == "4566/tcp"
        ));
    }

    #[test]
    fn test_default_resolver() {
        let default = DefaultResolver;
        assert_eq!(
            default.endpoint_for("iam", "us-east-1").unwrap().url,
            "https://iam.amazonaws.com"
        );
        assert_eq!(
            default.endpoint_for("sqs", "cn-north-1").unwrap().url,
            "https://sqs.cn-north-1.amazonaws.com.cn"
        );
        assert!(default.endpoint_for("", "us-east-1").is_err());
        assert!(default.endpoint_for("sqs", "").is_err());
    }

    #[test]
    fn test_custom_fallback() {
        struct Fixed;
        impl EndpointResolver for Fixed {
            fn endpoint_for(&self, _service: &str, _region: &str) -> Result<ResolvedEndpoint> {
                Ok(ResolvedEndpoint {
                    url: "http://fallback".to_string(),
                })
            }
        }

        let resolver = resolver(&["sqs"]).with_fallback(Arc::new(Fixed));
        assert_eq!(resolver.endpoint_for("sns", "us-east-1").unwrap().url, "http://fallback");
        assert_eq!(resolver.endpoint_for("sqs", "us-east-1").unwrap().url, "http://1.0.0.0:9566");
    }
}
