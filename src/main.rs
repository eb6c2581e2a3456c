//! mikrotik-gateway - HTTP gateway for a MikroTik router
//!
//! Fronts the router's management API for a local web client: proxies `/api`
//! calls upstream and implements the domain-blocking workflow on top of the
//! router's static DNS table.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mikrotik_gateway::config::Config;
use mikrotik_gateway::ledger::BlockLedger;
use mikrotik_gateway::server::{AppState, Server};
use mikrotik_gateway::upstream::MikroTikClient;

#[derive(Parser, Debug)]
#[command(name = "mikrotik-gateway")]
#[command(about = "HTTP gateway and site blocker for a MikroTik router")]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "MIKROTIK_GATEWAY_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args)?;

    init_tracing(&config.logging.level)?;

    tracing::info!(
        upstream = %config.upstream.base_url,
        "Starting mikrotik-gateway"
    );

    let router = Arc::new(MikroTikClient::new(config.upstream.clone()));
    let ledger = Arc::new(BlockLedger::new(
        config.block.ttl(),
        &config.block.target_address,
    ));

    let state = AppState {
        ledger,
        router,
        block: config.block.clone(),
    };

    let server = Server::new(config.server.clone(), config.cors.clone(), state);
    server.run(shutdown_signal()).await?;

    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    Ok(config)
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
