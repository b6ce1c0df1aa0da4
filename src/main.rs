//! Pixel Royale Server - battle royale backend
//!
//! This is the main entry point for the server. It handles:
//! - HTTP endpoints for game sessions and player stats
//! - WebSocket relay for peer-hosted sessions
//! - Server-hosted solo matches against bots

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pixel_royale::app::AppState;
use pixel_royale::config::Config;
use pixel_royale::http::build_router;
use pixel_royale::store::SessionStore;
use pixel_royale::util::time::init_server_time;

/// How often idle lobbies are swept
const LOBBY_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    init_tracing(&config.log_level);
    init_server_time();

    info!("Starting Pixel Royale Server");
    info!("Server address: {}", config.server_addr);
    match &config.stats_gateway_url {
        Some(url) => info!(gateway = %url, "Reporting match results to remote session service"),
        None => info!("Recording match results in the local session store"),
    }

    let state = AppState::new(config.clone());

    tokio::spawn(sweep_lobbies(
        state.sessions.clone(),
        chrono::Duration::seconds(config.lobby_ttl_secs as i64),
    ));

    let router = build_router(state);

    let addr: SocketAddr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);
    info!("Relay endpoint: ws://{}/ws", addr);
    info!("Solo endpoint: ws://{}/solo", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Periodically drop lobbies nobody started
async fn sweep_lobbies(sessions: SessionStore, ttl: chrono::Duration) {
    let mut ticker = tokio::time::interval(LOBBY_SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        let removed = sessions.sweep_expired_lobbies(ttl, chrono::Utc::now());
        if removed > 0 {
            info!(removed, "Expired idle lobbies");
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
