use std::net::SocketAddr;

use anyhow::Context;

use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::routes;
use crate::state::AppState;

/// Build state from `config`, migrate when asked to, then serve until shutdown
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Pharma Admin API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET is empty; login and protected routes will fail");
    }

    let port = config.api.port;
    let run_migrations = config.database.run_migrations;
    let state = AppState::from_config(config).context("failed to build application state")?;

    if run_migrations {
        DatabaseManager::migrate(&state.pool)
            .await
            .context("failed to apply migrations")?;
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Pharma Admin API listening on http://{}", addr);

    axum::serve(listener, routes::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
