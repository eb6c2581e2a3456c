//! Upstream router client
//!
//! This module defines the narrow contract the gateway has with the router's
//! management API: add a static DNS mapping, remove one, and forward an
//! arbitrary request. The MikroTik REST implementation lives in
//! [`mikrotik`]; tests substitute a mock.

pub mod mikrotik;

pub use mikrotik::MikroTikClient;

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use crate::error::UpstreamError;
use crate::models::Domain;

/// A request captured for forwarding to the router
///
/// Exists only for the duration of one proxied call and is fully consumed
/// by the client.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    /// HTTP method
    pub method: String,

    /// Path and query to request on the upstream, already rewritten
    pub path_and_query: String,

    /// Headers to forward (host-identifying headers already removed)
    pub headers: Vec<(String, String)>,

    /// Request body
    pub body: Bytes,
}

/// Response from a forwarded call
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    /// HTTP status code
    pub status: u16,

    /// Response headers
    pub headers: Vec<(String, String)>,

    /// Response body
    pub body: Bytes,
}

/// Contract with the router's management API
///
/// The gateway never interprets router payloads beyond success/failure and
/// the raw bytes it forwards.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouterClient: Send + Sync {
    /// Create a static DNS entry mapping `name` to `address` with the given TTL
    async fn add_static_dns(
        &self,
        name: &Domain,
        address: &str,
        ttl: Duration,
    ) -> Result<(), UpstreamError>;

    /// Remove the static DNS entries for `name`, if any exist
    async fn remove_static_dns(&self, name: &Domain) -> Result<(), UpstreamError>;

    /// Forward a request verbatim to the router's management interface
    async fn forward(&self, request: ProxyRequest) -> Result<ProxyResponse, UpstreamError>;
}
