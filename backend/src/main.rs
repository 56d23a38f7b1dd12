//! Main entry point for the Swap Shop backend.
//!
//! This file initializes tracing, loads configuration, sets up the database
//! and serves the application router built in [`app`].

mod api;
mod app;
mod auth;
mod config;
mod database;
mod errors;
mod repositories;
mod services;
mod utils;

use anyhow::Context;
use app::AppState;
use config::Config;
use database::Database;
use tracing::{error, info};
use tracing_subscriber::fmt::init;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let db = Database::new(&config)
        .await
        .context("Failed to initialize database")?;

    let state = AppState::new(config, db.pool().clone());

    if state.config.seed_database {
        db.seed(&state.hasher).await.context("Failed to seed database")?;
    }

    let bind_address = format!("0.0.0.0:{}", state.config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    info!(
        "Starting {} server on port {}",
        state.config.project_name, state.config.server_port
    );
    app::serve(listener, state, shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
