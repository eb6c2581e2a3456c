//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use bytes::Bytes;
use tokio::sync::Mutex;

use mikrotik_gateway::config::BlockConfig;
use mikrotik_gateway::error::UpstreamError;
use mikrotik_gateway::ledger::BlockLedger;
use mikrotik_gateway::models::Domain;
use mikrotik_gateway::server::{build_router, AppState};
use mikrotik_gateway::upstream::{ProxyRequest, ProxyResponse, RouterClient};

/// Recording stand-in for the router's management API
///
/// Records every call so tests can assert on the exact sequence of DNS
/// mutations and forwarded requests. Individual names can be configured to
/// fail, which exercises the rollback path.
#[derive(Default)]
pub struct RecordingRouter {
    /// (name, address) pairs added as static DNS entries
    pub added: Mutex<Vec<(String, String)>>,

    /// Names removed from the static DNS table
    pub removed: Mutex<Vec<String>>,

    /// Forwarded proxy requests
    pub forwarded: Mutex<Vec<ProxyRequest>>,

    /// Name whose add_static_dns call fails, if set
    pub fail_add: Mutex<Option<String>>,

    /// Canned response for forwarded requests
    pub forward_response: Mutex<Option<Result<ProxyResponse, UpstreamError>>>,
}

impl RecordingRouter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn fail_add_for(&self, name: &str) {
        *self.fail_add.lock().await = Some(name.to_string());
    }

    pub async fn clear_failures(&self) {
        *self.fail_add.lock().await = None;
    }

    pub async fn respond_to_forward(&self, response: Result<ProxyResponse, UpstreamError>) {
        *self.forward_response.lock().await = Some(response);
    }

    pub async fn added_names(&self) -> Vec<String> {
        self.added.lock().await.iter().map(|(n, _)| n.clone()).collect()
    }
}

#[async_trait]
impl RouterClient for RecordingRouter {
    async fn add_static_dns(
        &self,
        name: &Domain,
        address: &str,
        _ttl: Duration,
    ) -> Result<(), UpstreamError> {
        if self.fail_add.lock().await.as_deref() == Some(name.as_str()) {
            return Err(UpstreamError::Unreachable("connection refused".to_string()));
        }
        self.added
            .lock()
            .await
            .push((name.as_str().to_string(), address.to_string()));
        Ok(())
    }

    async fn remove_static_dns(&self, name: &Domain) -> Result<(), UpstreamError> {
        self.removed.lock().await.push(name.as_str().to_string());
        Ok(())
    }

    async fn forward(&self, request: ProxyRequest) -> Result<ProxyResponse, UpstreamError> {
        self.forwarded.lock().await.push(request);
        match self.forward_response.lock().await.clone() {
            Some(response) => response,
            None => Ok(ProxyResponse {
                status: 200,
                headers: vec![],
                body: Bytes::new(),
            }),
        }
    }
}

/// Start a gateway with the default one-day TTL
pub fn spawn_gateway(router: Arc<RecordingRouter>) -> TestServer {
    spawn_gateway_with_block(router, BlockConfig::default())
}

/// Start a gateway with a custom blocking configuration
pub fn spawn_gateway_with_block(router: Arc<RecordingRouter>, block: BlockConfig) -> TestServer {
    let state = AppState {
        ledger: Arc::new(BlockLedger::new(block.ttl(), &block.target_address)),
        router,
        block,
    };
    TestServer::new(build_router(state)).expect("failed to start test server")
}
