use response_rewrite_proxy::error::{ConfigError, TransformError, UpstreamError};
use std::time::Duration;

#[test]
fn test_config_error_misconfigured_address() {
    let error = ConfigError::MisconfiguredAddress {
        field: "rewrite.public_address",
    };
    assert!(error.to_string().contains("not configured"));
    assert!(error.to_string().contains("rewrite.public_address"));
}

#[test]
fn test_upstream_error_unreachable() {
    let error = UpstreamError::Unreachable {
        upstream: "http://backend:8080/".to_string(),
        reason: "Connection refused".to_string(),
    };
    assert!(error.to_string().contains("unreachable"));
    assert!(error.to_string().contains("Connection refused"));
    assert_eq!(error.status(), hyper::StatusCode::BAD_GATEWAY);
}

#[test]
fn test_upstream_error_timeout() {
    let error = UpstreamError::Timeout {
        upstream: "http://backend:8080/".to_string(),
        timeout: Duration::from_secs(30),
    };
    assert!(error.to_string().contains("timeout"));
    assert!(error.to_string().contains("30s"));
    assert_eq!(error.status(), hyper::StatusCode::GATEWAY_TIMEOUT);
}

#[test]
fn test_transform_error_display() {
    let error = TransformError::Decode {
        encoding: "UTF-8",
        len: 3,
    };
    assert_eq!(error.to_string(), "Failed to decode 3 bytes as UTF-8");

    let error = TransformError::Encode {
        encoding: "windows-1252",
    };
    assert!(error.to_string().contains("windows-1252"));
}

#[test]
fn test_config_errors_compare() {
    let error = ConfigError::PortConflict {
        first: "forward",
        second: "healthcheck",
        bind: "0.0.0.0:8080".to_string(),
    };
    assert_eq!(error.clone(), error);
    assert!(error.to_string().contains("0.0.0.0:8080"));

    let error = ConfigError::InvalidTriggerHeader {
        header: "a b".to_string(),
    };
    assert!(error.to_string().contains("a b"));
}

#[test]
fn test_invalid_address_is_bad_gateway() {
    let error = UpstreamError::InvalidAddress {
        address: "bad host".to_string(),
    };
    assert!(error.to_string().contains("bad host"));
    assert_eq!(error.status(), hyper::StatusCode::BAD_GATEWAY);
}
