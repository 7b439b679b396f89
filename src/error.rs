/// Error types for the response rewrite proxy
use std::time::Duration;
use thiserror::Error;

/// Configuration errors, all fatal at startup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required address is empty
    #[error("Required address is not configured: {field}")]
    MisconfiguredAddress { field: &'static str },

    /// Two enabled servers share a listen address
    #[error("Port conflict: {first} and {second} both bind {bind}")]
    PortConflict {
        first: &'static str,
        second: &'static str,
        bind: String,
    },

    /// Trigger header is not a valid HTTP header name
    #[error("Invalid trigger header name: {header}")]
    InvalidTriggerHeader { header: String },
}

/// Upstream connection errors
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Connection or request failed
    #[error("Upstream {upstream} unreachable: {reason}")]
    Unreachable { upstream: String, reason: String },

    /// Timeout
    #[error("Upstream request timeout to {upstream} after {timeout:?}")]
    Timeout { upstream: String, timeout: Duration },

    /// Invalid upstream address
    #[error("Invalid upstream address: {address}")]
    InvalidAddress { address: String },
}

impl UpstreamError {
    /// Gateway status reported to the client for this failure.
    pub fn status(&self) -> hyper::StatusCode {
        match self {
            UpstreamError::Timeout { .. } => hyper::StatusCode::GATEWAY_TIMEOUT,
            UpstreamError::Unreachable { .. } | UpstreamError::InvalidAddress { .. } => {
                hyper::StatusCode::BAD_GATEWAY
            }
        }
    }
}

/// Text transform errors. Always recovered locally by skipping the step.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// Bytes are not valid under the encoding
    #[error("Failed to decode {len} bytes as {encoding}")]
    Decode { encoding: &'static str, len: usize },

    /// Text cannot be represented in the encoding
    #[error("Failed to encode text as {encoding}")]
    Encode { encoding: &'static str },
}
