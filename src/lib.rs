// Library interface for localstack-harness
// Disposable Localstack containers for tests that exercise AWS SDK calls

pub mod cli;
pub mod clock;
pub mod config;
pub mod endpoint;
pub mod errors;
pub mod localstack;
pub mod runtime;
pub mod service;
pub mod session;

pub use endpoint::{EndpointResolver, LocalstackResolver, ResolvedEndpoint, ResolverMode};
pub use errors::{LocalstackError, Result};
pub use localstack::{LaunchOptions, Localstack};
pub use service::{Service, ServiceSet};
pub use session::SessionConfig;
