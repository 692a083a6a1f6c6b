use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocalstackError {
    #[error("Unknown Localstack service: {0}")]
    InvalidService(String),

    #[error("{context}: {source}")]
    RuntimeQuery {
        context: String,
        #[source]
        source: Box<LocalstackError>,
    },

    #[error("Could not start resource: {0}")]
    ResourceStart(#[source] Box<LocalstackError>),

    #[error("Unable to connect to {service}: {source}")]
    ServiceUnavailable {
        service: String,
        #[source]
        source: Box<LocalstackError>,
    },

    #[error("{context}: {source}")]
    Teardown {
        context: String,
        #[source]
        source: Box<LocalstackError>,
    },

    #[error("Gave up after {attempts} attempt(s): {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },

    #[error("Container has not reported Ready.")]
    NotReady,

    #[error("Docker error: {0}")]
    Docker(String),

    #[error("Service '{0}' is known but was not enabled for this Localstack instance")]
    EndpointNotEnabled(String),

    #[error("Container does not publish port {0}")]
    PortNotPublished(String),

    #[error("No endpoint for service '{service}' in region '{region}'")]
    UnknownEndpoint { service: String, region: String },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LocalstackError {
    /// Wrap a container listing/inspection failure with what was attempted
    pub fn runtime_query(context: impl Into<String>, source: LocalstackError) -> Self {
        LocalstackError::RuntimeQuery {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn teardown(context: impl Into<String>, source: LocalstackError) -> Self {
        LocalstackError::Teardown {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, LocalstackError>;
