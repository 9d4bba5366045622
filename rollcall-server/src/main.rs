//! rollcall-server - attendance capture service
//!
//! Accepts taps from the kiosk console or scanner relays, resolves them
//! through the institutional directory, and keeps the current event's
//! attendance in memory until the next "new event".

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rollcall_server::config::{ServerArgs, ServerConfig};
use rollcall_server::{build_router, AppState, PortalClient};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollcall_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting rollcall-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = ServerConfig::load(ServerArgs::parse());

    let portal = PortalClient::new(&config.directory)
        .context("Failed to initialize directory client")?;
    info!("Directory endpoint: {}", portal.lookup_url());
    if config.directory.accept_invalid_certs {
        info!("Directory TLS certificate verification is disabled");
    }
    info!("Export staging directory: {}", config.export_dir.display());

    let bind_addr = config.bind_addr();
    let state = AppState::new(config, Arc::new(portal));
    info!("Current event: {}", state.session.read().await.event().name);

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Listening on http://{}", bind_addr);
    info!("POST /api/tap -> record attendance");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("rollcall-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
