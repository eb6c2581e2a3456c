//! HTTP middleware for mikrotik-gateway
//!
//! Request/response logging. Bodies are never logged; forwarded calls may
//! carry router credentials.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Logging middleware function
///
/// Logs request and response details including:
/// - Method and path
/// - Status code
/// - Response time
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        path = %uri.path(),
        status = %status.as_u16(),
        duration_ms = %elapsed.as_millis(),
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use axum_test::TestServer;

    async fn test_handler() -> &'static str {
        "OK"
    }

    // Test 1: Logging middleware passes requests through unchanged
    #[tokio::test]
    async fn test_logging_middleware_passthrough() {
        let app = Router::new()
            .route("/ping", get(test_handler))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::new(app).unwrap();

        let response = server.get("/ping").await;
        response.assert_status_ok();
        response.assert_text("OK");
    }
}
