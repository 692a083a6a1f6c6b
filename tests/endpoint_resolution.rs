// Endpoint routing and session configuration for a launched instance
mod common;

use common::*;
use localstack_harness::endpoint::{EndpointResolver, SDK_SERVICE_IDS};
use localstack_harness::localstack::{LaunchOptions, Localstack};
use localstack_harness::runtime::{PortBinding, RetryOutcome, ScriptedRuntime};
use localstack_harness::service::AVAILABLE_SERVICES;
use localstack_harness::{LocalstackError, ResolverMode};
use std::sync::Arc;

fn launch(names: &[&str]) -> Localstack {
    let mut runtime = ScriptedRuntime::new().with_run(localstack_details("c1"));
    for _ in names {
        runtime = runtime.with_retry(RetryOutcome::Ready);
    }
    Localstack::launch(services(names), Arc::new(runtime), &LaunchOptions::default())
        .expect("scripted launch should succeed")
}

#[test]
fn test_every_sdk_id_resolves_when_all_services_enabled() {
    let localstack = launch(AVAILABLE_SERVICES);
    let resolver = localstack.resolver();

    for (sdk_id, _) in SDK_SERVICE_IDS {
        let endpoint = resolver.endpoint_for(sdk_id, "us-east-1").unwrap();
        assert_eq!(endpoint.url, DEFAULT_URL, "{} was not routed to Localstack", sdk_id);
    }
}

#[test]
fn test_disabled_services_use_default_endpoints() {
    let localstack = launch(&["s3"]);
    let resolver = localstack.resolver();

    assert_eq!(resolver.endpoint_for("s3", "us-east-1").unwrap().url, DEFAULT_URL);

    for (sdk_id, _) in SDK_SERVICE_IDS.iter().filter(|(id, _)| *id != "s3") {
        let endpoint = resolver.endpoint_for(sdk_id, "us-east-1").unwrap();
        assert_ne!(endpoint.url, DEFAULT_URL, "{} should not be routed", sdk_id);
        assert!(endpoint.url.starts_with("https://"));
    }
}

#[test]
fn test_renamed_ids_follow_their_service() {
    let localstack = launch(&["dynamodbstreams", "ses"]);
    let resolver = localstack.resolver();

    assert_eq!(
        resolver.endpoint_for("streams.dynamodb", "us-east-1").unwrap().url,
        DEFAULT_URL
    );
    assert_eq!(resolver.endpoint_for("email", "us-east-1").unwrap().url, DEFAULT_URL);
    assert_ne!(resolver.endpoint_for("dynamodb", "us-east-1").unwrap().url, DEFAULT_URL);
}

#[test]
fn test_ipv6_published_host_yields_valid_url() {
    let mut details = localstack_details("c1");
    details.ports.insert(
        "4566/tcp".to_string(),
        vec![PortBinding {
            host_ip: "::".to_string(),
            host_port: "49153".to_string(),
        }],
    );
    let runtime = ScriptedRuntime::new()
        .with_run(details)
        .with_retry(RetryOutcome::Ready);
    let localstack =
        Localstack::launch(services(&["s3"]), Arc::new(runtime), &LaunchOptions::default())
            .unwrap();

    assert_eq!(localstack.host_port(), Some("[::]:49153".to_string()));
    assert_eq!(
        localstack.resolver().endpoint_for("s3", "us-east-1").unwrap().url,
        "http://[::]:49153"
    );
}

#[test]
fn test_strict_resolver_mode() {
    let localstack = launch(&["sqs"]).with_resolver_mode(ResolverMode::Strict);
    let resolver = localstack.resolver();

    assert_eq!(resolver.endpoint_for("sqs", "us-east-1").unwrap().url, DEFAULT_URL);
    assert!(matches!(
        resolver.endpoint_for("sns", "us-east-1"),
        Err(LocalstackError::EndpointNotEnabled(_))
    ));
}

#[test]
fn test_session_config_is_constant() {
    for names in [&["s3"][..], &["sqs", "sns", "iam"][..], &[][..]] {
        let localstack = launch(names);
        let session = localstack.create_session_config();

        assert_eq!(session.region, "us-east-1");
        assert!(session.disable_ssl);
        assert!(session.s3_force_path_style);
        assert_eq!(session.credentials.access_key_id, "a");
        assert_eq!(session.credentials.secret_access_key, "b");
        assert_eq!(session.credentials.session_token, "c");
    }
}

#[test]
fn test_session_routes_through_resolver() {
    let localstack = launch(&["s3", "sqs"]);
    let session = localstack.create_session_config();

    assert_eq!(session.endpoint_for("s3").unwrap().url, DEFAULT_URL);
    assert_eq!(
        session.endpoint_for("kinesis").unwrap().url,
        "https://kinesis.us-east-1.amazonaws.com"
    );
}
