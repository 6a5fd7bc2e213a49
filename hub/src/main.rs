mod auth;
mod cache;
mod config;
mod db;
mod error;
mod routes;
mod state;

use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use config::HubConfig;
use state::AppState;

#[tokio::main]
async fn main() {
    // Initialise tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("arena-hub exited: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = HubConfig::from_env();
    let addr: SocketAddr = format!("{}:{}", cfg.bind, cfg.port).parse()?;

    if cfg.webhook_secret.is_empty() {
        tracing::warn!("ARENA_WEBHOOK_SECRET is empty; webhook routes are disabled");
    }
    tracing::info!(
        default_range = cfg.default_range.as_str(),
        cache_ttl_s = cfg.chart_cache_ttl_s,
        baseline = %cfg.baseline_symbol,
        "chart settings"
    );

    let state = AppState::new(cfg)?;
    let app = routes::app(state);

    tracing::info!("Arena hub listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully stopping…");
}
