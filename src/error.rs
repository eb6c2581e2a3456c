//! Application error types for mikrotik-gateway
//!
//! This module defines common error types used throughout the application.
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Domain validation errors
///
/// Raised when a caller submits something that is not a plain host name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Empty input after trimming
    #[error("Domain must not be empty")]
    Empty,

    /// Input contains a URL scheme
    #[error("Domain must not contain a scheme: {0}")]
    ContainsScheme(String),

    /// Input contains a path separator
    #[error("Domain must not contain a path: {0}")]
    ContainsPath(String),

    /// Input contains a port
    #[error("Domain must not contain a port: {0}")]
    ContainsPort(String),

    /// Input exceeds the maximum host name length
    #[error("Domain exceeds {max} characters", max = crate::models::domain::MAX_DOMAIN_LEN)]
    TooLong,

    /// Input has a label that violates host name grammar
    #[error("Invalid host name label: {0}")]
    InvalidLabel(String),
}

/// Failures reported by the upstream router
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Router could not be reached (connect failure or timeout)
    #[error("Router unreachable: {0}")]
    Unreachable(String),

    /// Router rejected the management credentials
    #[error("Router rejected credentials")]
    AuthRejected,

    /// Router rejected the request as malformed
    #[error("Router rejected request: {0}")]
    Malformed(String),

    /// Anything else the router returned
    #[error("Unexpected router error: {0}")]
    Unknown(String),
}

impl UpstreamError {
    /// HTTP status the gateway responds with for this error class
    ///
    /// Unreachable maps to 502 (caller may retry after a backoff),
    /// AuthRejected to 503, everything else to 500.
    pub fn status_code(&self) -> u16 {
        match self {
            UpstreamError::Unreachable(_) => 502,
            UpstreamError::AuthRejected => 503,
            UpstreamError::Malformed(_) | UpstreamError::Unknown(_) => 500,
        }
    }

    /// Message safe to expose to clients
    ///
    /// Auth failures get a generic message; credentials are never echoed.
    pub fn client_message(&self) -> String {
        match self {
            UpstreamError::AuthRejected => "Router configuration unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

/// Application-level error type
///
/// Aggregates the domain-specific error types for contexts that can fail in
/// more than one way.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Client input malformed
    #[error("Invalid domain: {0}")]
    Domain(#[from] DomainError),

    /// Upstream router failure
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
