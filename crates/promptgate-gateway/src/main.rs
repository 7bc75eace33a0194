//! Promptgate
//!
//! Policy gateway for LLM traffic: inspects both sides of every
//! exchange, blocks or audits flagged content, and replays test suites
//! against the same path to score gateway behavior.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use promptgate_gateway::{create_router, AppState, Cli, GatewayConfig};
use promptgate_store::MemoryStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("Starting Promptgate");

    let config = GatewayConfig::load(&cli.config, &cli)?;
    info!("Upstream: {}", config.upstream_url);
    info!("Enforcement mode: {}", config.mode);

    let metrics_handle = init_metrics()?;

    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(&config, store, Some(metrics_handle))?;

    let addr: SocketAddr = format!("{}:{}", cli.listen, cli.port).parse()?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Gateway listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            warn!("Shutdown signal received, stopping server...");
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("promptgate=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("promptgate=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "promptgate_requests_total",
        "Total number of chat requests processed"
    );
    metrics::describe_counter!(
        "promptgate_decisions_total",
        "Total number of gate decisions by phase and action"
    );
    metrics::describe_counter!("promptgate_runs_total", "Total number of suite runs submitted");
    metrics::describe_counter!(
        "promptgate_run_cases_total",
        "Total number of run cases scored by result"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
