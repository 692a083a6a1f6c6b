// SDK client configuration pointed at a Localstack container

use crate::endpoint::{EndpointResolver, ResolvedEndpoint};
use crate::errors::Result;
use std::fmt;
use std::sync::Arc;

/// Region every session is created in
pub const SESSION_REGION: &str = "us-east-1";

/// Static placeholder credentials; Localstack accepts anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

impl Default for StaticCredentials {
    fn default() -> Self {
        Self {
            access_key_id: "a".to_string(),
            secret_access_key: "b".to_string(),
            session_token: "c".to_string(),
        }
    }
}

/// Everything an SDK client needs to talk to Localstack instead of AWS
#[derive(Clone)]
pub struct SessionConfig {
    pub region: String,
    pub endpoint_resolver: Arc<dyn EndpointResolver>,
    pub disable_ssl: bool,
    /// Address buckets as `host/bucket` rather than `bucket.host`
    pub s3_force_path_style: bool,
    pub credentials: StaticCredentials,
}

impl SessionConfig {
    pub(crate) fn new(endpoint_resolver: Arc<dyn EndpointResolver>) -> Self {
        Self {
            region: SESSION_REGION.to_string(),
            endpoint_resolver,
            disable_ssl: true,
            s3_force_path_style: true,
            credentials: StaticCredentials::default(),
        }
    }

    /// Resolve `service` in this session's region
    pub fn endpoint_for(&self, service: &str) -> Result<ResolvedEndpoint> {
        self.endpoint_resolver.endpoint_for(service, &self.region)
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("region", &self.region)
            .field("disable_ssl", &self.disable_ssl)
            .field("s3_force_path_style", &self.s3_force_path_style)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
