//! HTTP server components for mikrotik-gateway
//!
//! This module provides the HTTP server infrastructure including:
//! - Router configuration and route handlers
//! - Request logging middleware
//! - Cross-origin policy
//! - Server lifecycle management

pub mod middleware;
pub mod router;

pub use router::{build_router, AppState, HealthResponse};

use std::future::Future;
use std::net::SocketAddr;

use axum::http::{header, HeaderName, HeaderValue, Method};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::config::{CorsConfig, ServerConfig};

/// Non-standard header the web client sends alongside credentials
const X_SESSION_ID: HeaderName = HeaderName::from_static("x-session-id");

/// HTTP Server for mikrotik-gateway
///
/// Manages the axum server lifecycle, including:
/// - Binding to configured address
/// - Applying middleware layers
/// - Graceful shutdown handling
pub struct Server {
    config: ServerConfig,
    cors: CorsConfig,
    state: AppState,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: ServerConfig, cors: CorsConfig, state: AppState) -> Self {
        Self {
            config,
            cors,
            state,
        }
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(
            self.config.host.parse().unwrap_or([0, 0, 0, 0].into()),
            self.config.port,
        )
    }

    /// Run the server until shutdown signal is received
    ///
    /// # Arguments
    ///
    /// * `shutdown` - Future that resolves when the server should shut down
    pub async fn run(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let addr = self.bind_addr();
        let app = build_router(self.state);

        // Apply middleware layers
        let app = app
            .layer(axum::middleware::from_fn(middleware::logging_middleware))
            .layer(cors_layer(&self.cors)?)
            .layer(tower_http::trace::TraceLayer::new_for_http());

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Build the cross-origin layer from configuration
///
/// Exactly one origin is allowed, with the fixed method and header
/// allow-lists the web client uses. Anything else is rejected at the edge
/// rather than passed upstream.
pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, ServerError> {
    let origin: HeaderValue = config
        .allowed_origin
        .parse()
        .map_err(|_| ServerError::Config(format!("Invalid origin: {}", config.allowed_origin)))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, X_SESSION_ID]))
}

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to address
    #[error("Failed to bind to address: {0}")]
    Bind(String),

    /// Failed to serve requests
    #[error("Server error: {0}")]
    Serve(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
