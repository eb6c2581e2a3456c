//! HTTP router for mikrotik-gateway
//!
//! This module defines the axum router that handles all HTTP requests.
//! It provides routes for:
//! - Health checks
//! - The domain-blocking workflow
//! - The blocked-sites listing
//! - The generic reverse proxy to the router's management API

use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{any, get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::BlockConfig;
use crate::ledger::BlockLedger;
use crate::models::{BlockedEntry, Domain};
use crate::upstream::{ProxyRequest, RouterClient};

/// Prefix under which the generic proxy is exposed
const API_PREFIX: &str = "/api";

/// Largest request body the proxy will buffer for forwarding
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Response headers that must not be copied back from the upstream
const SKIP_RESPONSE_HEADERS: &[&str] = &["transfer-encoding", "connection", "content-length"];

/// Shared application state
///
/// Constructed once at startup and passed by reference into handlers; the
/// ledger is the only mutable piece and serializes its own mutations.
pub struct AppState {
    /// Ledger of active blocks
    pub ledger: Arc<BlockLedger>,

    /// Client for the upstream router
    pub router: Arc<dyn RouterClient>,

    /// Blocking configuration (TTL, target address)
    pub block: BlockConfig,
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            router: Arc::clone(&self.router),
            block: self.block.clone(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Block request body
#[derive(Debug, Deserialize)]
pub struct BlockSiteRequest {
    pub domain: String,
}

/// Build the main application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/block-site", post(block_site_handler))
        .route("/blocked-sites", get(blocked_sites_handler))
        // Generic proxy to the router's management API
        .route("/api", any(proxy_handler))
        .route("/api/*path", any(proxy_handler))
        .with_state(state)
}

// =============================================================================
// Health Handler
// =============================================================================

/// Health check endpoint handler
///
/// Responds independently of upstream reachability.
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Proxy server is running".to_string(),
    })
}

// =============================================================================
// Block Workflow Handlers
// =============================================================================

/// Block a domain and its `www.` variant via static DNS entries
///
/// All-or-nothing per request: if the router rejects any variant, the
/// ledger entries created here are rolled back and already-applied router
/// entries are removed best-effort before the failure is reported.
async fn block_site_handler(
    State(state): State<AppState>,
    Json(payload): Json<BlockSiteRequest>,
) -> Response {
    let pair = match Domain::normalize(&payload.domain) {
        Ok(pair) => pair,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "Invalid domain",
                    "message": format!("domain: {}", e),
                })),
            )
                .into_response();
        }
    };

    let now = Utc::now();
    let outcome = state.ledger.try_block(&pair, now).await;

    if outcome.is_noop() {
        tracing::info!(domain = %pair.root, "Domain already blocked");
        return (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": format!("{} and {} are already blocked", pair.root, pair.www),
            })),
        )
            .into_response();
    }

    let mut applied: Vec<&BlockedEntry> = Vec::new();
    for entry in &outcome.accepted {
        let result = state
            .router
            .add_static_dns(&entry.domain, &entry.target_address, state.block.ttl())
            .await;

        if let Err(e) = result {
            tracing::error!(
                domain = %entry.domain,
                error = %e,
                "Failed to add static DNS entry, rolling back"
            );
            state.ledger.rollback(&outcome.accepted).await;
            for done in applied {
                if let Err(re) = state.router.remove_static_dns(&done.domain).await {
                    // The router may still hold this entry; the lazy
                    // idempotency check absorbs it on the next attempt.
                    tracing::warn!(domain = %done.domain, error = %re, "Rollback removal failed");
                }
            }

            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (
                status,
                Json(serde_json::json!({
                    "error": "Failed to block site",
                    "message": e.client_message(),
                })),
            )
                .into_response();
        }

        applied.push(entry);
    }

    tracing::info!(
        domain = %pair.root,
        accepted = outcome.accepted.len(),
        already_active = outcome.already_active.len(),
        "Domain blocked"
    );

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "message": format!("{} and {} are now blocked", pair.root, pair.www),
        })),
    )
        .into_response()
}

/// List active block entries in insertion order
async fn blocked_sites_handler(State(state): State<AppState>) -> impl IntoResponse {
    let entries = state.ledger.list_active(Utc::now()).await;
    Json(serde_json::json!({
        "total": entries.len(),
        "blocked_sites": entries,
    }))
}

// =============================================================================
// Proxy Handler
// =============================================================================

/// Forward a request to the router's management API
///
/// The `/api` prefix is stripped before forwarding; method, headers (minus
/// host-identifying ones), and body pass through verbatim.
async fn proxy_handler(State(state): State<AppState>, req: Request) -> Response {
    let method = req.method().to_string();
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let rewritten = rewrite_api_path(&path_and_query);

    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let body = match to_bytes(req.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "Invalid request body",
                    "message": e.to_string(),
                })),
            )
                .into_response();
        }
    };

    tracing::info!(method = %method, path = %rewritten, "Proxying request to router");

    let forwarded = state
        .router
        .forward(ProxyRequest {
            method,
            path_and_query: rewritten,
            headers,
            body,
        })
        .await;

    match forwarded {
        Ok(upstream) => {
            let status =
                StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
            let mut response = Response::builder().status(status);
            for (name, value) in &upstream.headers {
                if SKIP_RESPONSE_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                    continue;
                }
                let (Ok(name), Ok(value)) = (
                    HeaderName::try_from(name.as_str()),
                    HeaderValue::try_from(value.as_str()),
                ) else {
                    continue;
                };
                response = response.header(name, value);
            }
            response
                .body(axum::body::Body::from(upstream.body))
                .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "Proxy error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Proxy error connecting to MikroTik router",
                    "message": e.client_message(),
                })),
            )
                .into_response()
        }
    }
}

/// Strip the gateway's `/api` prefix from a path, keeping the query string
fn rewrite_api_path(path_and_query: &str) -> String {
    let stripped = path_and_query
        .strip_prefix(API_PREFIX)
        .unwrap_or(path_and_query);
    if stripped.is_empty() {
        "/".to_string()
    } else if stripped.starts_with('?') {
        format!("/{}", stripped)
    } else {
        stripped.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpstreamError;
    use crate::upstream::{MockRouterClient, ProxyResponse};
    use axum_test::TestServer;
    use bytes::Bytes;
    use mockall::predicate;

    fn state_with(router: MockRouterClient) -> AppState {
        let block = BlockConfig::default();
        AppState {
            ledger: Arc::new(BlockLedger::new(block.ttl(), &block.target_address)),
            router: Arc::new(router),
            block,
        }
    }

    fn server_with(router: MockRouterClient) -> TestServer {
        TestServer::new(build_router(state_with(router))).unwrap()
    }

    // Test 1: Health endpoint returns ok without touching the upstream
    #[tokio::test]
    async fn test_health_endpoint() {
        let server = server_with(MockRouterClient::new());

        let response = server.get("/health").await;
        response.assert_status_ok();

        let body: HealthResponse = response.json();
        assert_eq!(body.status, "ok");
        assert_eq!(body.message, "Proxy server is running");
    }

    // Test 2: Invalid domain yields 400 naming the field
    #[tokio::test]
    async fn test_block_site_invalid_domain() {
        let server = server_with(MockRouterClient::new());

        let response = server
            .post("/block-site")
            .json(&serde_json::json!({"domain": "http://x.com"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "Invalid domain");
        assert!(body["message"].as_str().unwrap().starts_with("domain:"));
    }

    // Test 3: Successful block adds one static DNS entry per variant
    #[tokio::test]
    async fn test_block_site_success() {
        let mut router = MockRouterClient::new();
        router
            .expect_add_static_dns()
            .times(2)
            .returning(|_, _, _| Ok(()));

        let server = server_with(router);

        let response = server
            .post("/block-site")
            .json(&serde_json::json!({"domain": "Example.COM"}))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(
            body["message"],
            "example.com and www.example.com are now blocked"
        );

        let listing = server.get("/blocked-sites").await;
        let body: serde_json::Value = listing.json();
        assert_eq!(body["total"], 2);
    }

    // Test 4: Re-blocking an active domain is an idempotent 200
    #[tokio::test]
    async fn test_block_site_already_active() {
        let mut router = MockRouterClient::new();
        // Only the first request reaches the router
        router
            .expect_add_static_dns()
            .times(2)
            .returning(|_, _, _| Ok(()));

        let server = server_with(router);

        let payload = serde_json::json!({"domain": "example.com"});
        server.post("/block-site").json(&payload).await.assert_status_ok();

        let response = server.post("/block-site").json(&payload).await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(
            body["message"],
            "example.com and www.example.com are already blocked"
        );
    }

    // Test 5: Upstream failure on the second variant rolls everything back
    #[tokio::test]
    async fn test_block_site_rollback_on_partial_failure() {
        let mut router = MockRouterClient::new();
        router
            .expect_add_static_dns()
            .withf(|name, _, _| name.as_str() == "example.com")
            .times(1)
            .returning(|_, _, _| Ok(()));
        router
            .expect_add_static_dns()
            .withf(|name, _, _| name.as_str() == "www.example.com")
            .times(1)
            .returning(|_, _, _| Err(UpstreamError::Unreachable("timeout".to_string())));
        // The applied root entry is compensated upstream
        router
            .expect_remove_static_dns()
            .with(predicate::function(|name: &Domain| {
                name.as_str() == "example.com"
            }))
            .times(1)
            .returning(|_| Ok(()));

        let server = server_with(router);

        let response = server
            .post("/block-site")
            .json(&serde_json::json!({"domain": "example.com"}))
            .await;
        response.assert_status(StatusCode::BAD_GATEWAY);

        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "Failed to block site");

        // No partial block is listed as active afterwards
        let listing = server.get("/blocked-sites").await;
        let body: serde_json::Value = listing.json();
        assert_eq!(body["total"], 0);
    }

    // Test 6: Auth rejection maps to 503 with a generic message
    #[tokio::test]
    async fn test_block_site_auth_rejected() {
        let mut router = MockRouterClient::new();
        router
            .expect_add_static_dns()
            .times(1)
            .returning(|_, _, _| Err(UpstreamError::AuthRejected));

        let server = server_with(router);

        let response = server
            .post("/block-site")
            .json(&serde_json::json!({"domain": "example.com"}))
            .await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Router configuration unavailable");
    }

    // Test 7: Proxy strips the /api prefix and forwards verbatim
    #[tokio::test]
    async fn test_proxy_rewrites_path() {
        let mut router = MockRouterClient::new();
        router
            .expect_forward()
            .withf(|req: &ProxyRequest| {
                req.method == "GET" && req.path_and_query == "/foo?x=1"
            })
            .times(1)
            .returning(|_| {
                Ok(ProxyResponse {
                    status: 200,
                    headers: vec![("content-type".to_string(), "application/json".to_string())],
                    body: Bytes::from_static(b"{\"ok\":true}"),
                })
            });

        let server = server_with(router);

        let response = server.get("/api/foo").add_query_param("x", "1").await;
        response.assert_status_ok();
        response.assert_text("{\"ok\":true}");
    }

    // Test 8: Proxy preserves the request body and method
    #[tokio::test]
    async fn test_proxy_preserves_body() {
        let mut router = MockRouterClient::new();
        router
            .expect_forward()
            .withf(|req: &ProxyRequest| {
                req.method == "PUT" && req.body == Bytes::from_static(b"{\"name\":\"x\"}")
            })
            .times(1)
            .returning(|_| {
                Ok(ProxyResponse {
                    status: 201,
                    headers: vec![],
                    body: Bytes::new(),
                })
            });

        let server = server_with(router);

        let response = server
            .put("/api/rest/ip/dns/static")
            .json(&serde_json::json!({"name": "x"}))
            .await;
        response.assert_status(StatusCode::CREATED);
    }

    // Test 9: Unreachable upstream yields a structured 500, not a raw error
    #[tokio::test]
    async fn test_proxy_unreachable_upstream() {
        let mut router = MockRouterClient::new();
        router.expect_forward().times(1).returning(|_| {
            Err(UpstreamError::Unreachable("connection refused".to_string()))
        });

        let server = server_with(router);

        let response = server.get("/api/foo").await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "Proxy error connecting to MikroTik router");
        assert!(body["message"].as_str().unwrap().contains("unreachable") || body["message"].as_str().unwrap().contains("refused"));
    }

    // Test 10: Upstream error statuses pass through unchanged
    #[tokio::test]
    async fn test_proxy_passes_upstream_status() {
        let mut router = MockRouterClient::new();
        router.expect_forward().times(1).returning(|_| {
            Ok(ProxyResponse {
                status: 404,
                headers: vec![],
                body: Bytes::from_static(b"no such command"),
            })
        });

        let server = server_with(router);

        let response = server.get("/api/rest/nope").await;
        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_text("no such command");
    }

    // Test 11: Path rewriting edge cases
    #[test]
    fn test_rewrite_api_path() {
        assert_eq!(rewrite_api_path("/api/foo?x=1"), "/foo?x=1");
        assert_eq!(rewrite_api_path("/api/foo/bar"), "/foo/bar");
        assert_eq!(rewrite_api_path("/api"), "/");
        assert_eq!(rewrite_api_path("/api?x=1"), "/?x=1");
    }

    // Test 12: Unknown routes are 404, not proxied
    #[tokio::test]
    async fn test_unknown_route_not_proxied() {
        let server = server_with(MockRouterClient::new());

        let response = server.get("/not-a-route").await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
