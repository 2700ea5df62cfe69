//! Client construction and request-shape tests.
//!
//! Wire-level behavior against a live gateway is exercised in deployment
//! smoke tests; here we cover what can be validated hermetically.

use std::time::Duration;

use architect_model::{ChatModelConfig, GatewayChatClient, MessageRole, ModelError};

#[test]
fn rejects_empty_base_url() {
    let config = ChatModelConfig::new("", "key", "claude-sonnet-4-5");
    let err = GatewayChatClient::new(config).unwrap_err();
    assert!(matches!(err, ModelError::Config(_)));
}

#[test]
fn rejects_empty_model() {
    let config = ChatModelConfig::new("https://gateway.example.net/v1", "key", "");
    let err = GatewayChatClient::new(config).unwrap_err();
    assert!(matches!(err, ModelError::Config(_)));
}

#[test]
fn config_defaults_and_overrides() {
    let config = ChatModelConfig::new("https://gateway.example.net/v1", "key", "m");
    assert_eq!(config.timeout, Duration::from_secs(60));

    let config = config.with_timeout(Duration::from_secs(5));
    assert_eq!(config.timeout, Duration::from_secs(5));
}

#[test]
fn message_roles_serialize_lowercase() {
    assert_eq!(serde_json::to_string(&MessageRole::User).unwrap(), "\"user\"");
    assert_eq!(serde_json::to_string(&MessageRole::Assistant).unwrap(), "\"assistant\"");
}

#[test]
fn unavailable_errors_render_their_cause() {
    let err = ModelError::GenerationUnavailable { message: "request timed out".into() };
    assert_eq!(err.to_string(), "generation unavailable: request timed out");
}
