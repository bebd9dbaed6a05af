//! Roomkeep Server — application entry point.

use anyhow::Context;
use roomkeep_db::DbManager;
use roomkeep_server::{AppState, ServerConfig, bootstrap_admin, router};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roomkeep=info")),
        )
        .json()
        .init();

    tracing::info!("Starting Roomkeep server...");

    let config = ServerConfig::from_env().context("invalid configuration")?;

    let manager = DbManager::connect(&config.db)
        .await
        .context("cannot connect to SurrealDB")?;
    roomkeep_db::run_migrations(manager.client())
        .await
        .context("schema migration failed")?;

    let state = AppState::new(manager.client().clone(), config.auth, config.booking);
    if let Some(admin) = &config.bootstrap_admin {
        bootstrap_admin(&state, admin)
            .await
            .context("cannot create bootstrap admin")?;
    }

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("cannot bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Roomkeep server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
