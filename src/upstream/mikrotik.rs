//! MikroTik RouterOS REST client
//!
//! Implements [`RouterClient`](super::RouterClient) against the RouterOS v7
//! REST API: static DNS entries live under `/rest/ip/dns/static`, and
//! forwarded calls are replayed against the router root with method,
//! headers, and body preserved.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;
use crate::error::UpstreamError;
use crate::models::Domain;

use super::{ProxyRequest, ProxyResponse, RouterClient};

/// Headers that identify the gateway host and must not be forwarded
const HOP_HEADERS: &[&str] = &["host", "content-length", "connection"];

/// RouterOS REST client over reqwest
#[derive(Debug, Clone)]
pub struct MikroTikClient {
    client: Client,
    config: UpstreamConfig,
}

impl MikroTikClient {
    /// Create a client for the configured router
    pub fn new(config: UpstreamConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .expect("Failed to create HTTP client");
        Self { client, config }
    }

    /// Create a client with a custom reqwest Client
    pub fn with_client(client: Client, config: UpstreamConfig) -> Self {
        Self { client, config }
    }

    fn static_dns_url(&self) -> String {
        format!(
            "{}/rest/ip/dns/static",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Attach management credentials when configured
    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.username {
            Some(user) => req.basic_auth(user, self.config.password.as_deref()),
            None => req,
        }
    }

    fn classify_send_error(e: reqwest::Error) -> UpstreamError {
        if e.is_timeout() {
            UpstreamError::Unreachable("request timed out".to_string())
        } else if e.is_connect() {
            UpstreamError::Unreachable(e.to_string())
        } else {
            UpstreamError::Unknown(e.to_string())
        }
    }

    async fn classify_status(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(UpstreamError::AuthRejected),
            StatusCode::BAD_REQUEST => {
                let detail = response.text().await.unwrap_or_default();
                Err(UpstreamError::Malformed(detail))
            }
            status => Err(UpstreamError::Unknown(format!("HTTP {}", status.as_u16()))),
        }
    }
}

#[async_trait]
impl RouterClient for MikroTikClient {
    async fn add_static_dns(
        &self,
        name: &Domain,
        address: &str,
        ttl: Duration,
    ) -> Result<(), UpstreamError> {
        let body = serde_json::json!({
            "name": name.as_str(),
            "address": address,
            "ttl": routeros_duration(ttl),
        });

        debug!(name = %name, address = address, "Adding static DNS entry");

        let response = self
            .authorized(self.client.put(self.static_dns_url()))
            .json(&body)
            .send()
            .await
            .map_err(Self::classify_send_error)?;

        Self::classify_status(response).await.map(|_| ())
    }

    async fn remove_static_dns(&self, name: &Domain) -> Result<(), UpstreamError> {
        // The REST API deletes by internal id, so look the entries up first
        let response = self
            .authorized(self.client.get(self.static_dns_url()))
            .query(&[("name", name.as_str())])
            .send()
            .await
            .map_err(Self::classify_send_error)?;
        let response = Self::classify_status(response).await?;

        let entries: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| UpstreamError::Unknown(e.to_string()))?;

        for entry in entries {
            let Some(id) = entry.get(".id").and_then(|v| v.as_str()) else {
                warn!(name = %name, "Static DNS entry without .id in router response");
                continue;
            };

            debug!(name = %name, id = id, "Removing static DNS entry");

            let response = self
                .authorized(
                    self.client
                        .delete(format!("{}/{}", self.static_dns_url(), id)),
                )
                .send()
                .await
                .map_err(Self::classify_send_error)?;
            Self::classify_status(response).await?;
        }

        Ok(())
    }

    async fn forward(&self, request: ProxyRequest) -> Result<ProxyResponse, UpstreamError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| UpstreamError::Malformed(format!("Invalid method: {}", request.method)))?;
        let url = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            request.path_and_query
        );

        let mut builder = self.client.request(method, &url);
        for (name, value) in &request.headers {
            if HOP_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                continue;
            }
            builder = builder.header(name, value);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await.map_err(Self::classify_send_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Unknown(e.to_string()))?;

        Ok(ProxyResponse {
            status,
            headers,
            body,
        })
    }
}

/// Format a duration in RouterOS unit syntax (e.g. `1d`, `2h30m`, `45s`)
pub fn routeros_duration(ttl: Duration) -> String {
    let total = ttl.as_secs();
    if total == 0 {
        return "0s".to_string();
    }

    let days = total / 86400;
    let hours = (total % 86400) / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{}d", days));
    }
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if seconds > 0 {
        out.push_str(&format!("{}s", seconds));
    }
    out
}
