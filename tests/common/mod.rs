/// Common fixtures for localstack-harness integration tests
use localstack_harness::localstack::{LOCALSTACK_REPOSITORY, LOCALSTACK_TAG};
use localstack_harness::runtime::{ContainerDetails, ContainerSummary, PortBinding};
use localstack_harness::ServiceSet;
use std::sync::Arc;

pub const LOCALSTACK_NAME: &str = "testLocalstackName";

/// Published address used by every fixture container
pub const DEFAULT_URL: &str = "http://1.0.0.0:9566";

/// A listed Localstack container with the given id and name
#[allow(dead_code)]
pub fn localstack_summary(id: &str, name: &str) -> ContainerSummary {
    ContainerSummary {
        id: id.to_string(),
        image: format!("{}:{}", LOCALSTACK_REPOSITORY, LOCALSTACK_TAG),
        names: vec![format!("/{}", name)],
    }
}

/// An inspected container publishing 4566/tcp on 1.0.0.0:9566
#[allow(dead_code)]
pub fn localstack_details(id: &str) -> ContainerDetails {
    let mut details = ContainerDetails {
        id: id.to_string(),
        name: format!("/{}", LOCALSTACK_NAME),
        image: format!("{}:{}", LOCALSTACK_REPOSITORY, LOCALSTACK_TAG),
        ..Default::default()
    };
    details.ports.insert(
        "4566/tcp".to_string(),
        vec![PortBinding {
            host_ip: "1.0.0.0".to_string(),
            host_port: "9566".to_string(),
        }],
    );
    details
}

#[allow(dead_code)]
pub fn services(names: &[&str]) -> Arc<ServiceSet> {
    Arc::new(ServiceSet::from_names(names).expect("fixture services must be valid"))
}
