//! Threadline Server: Application entry point.

mod config;
mod state;

use anyhow::Context;
use threadline_db::DbManager;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("threadline=info".parse()?))
        .json()
        .init();

    tracing::info!("Starting Threadline server...");

    let config = ServerConfig::from_env()?;

    let manager = DbManager::connect(&config.db)
        .await
        .context("connect to SurrealDB")?;
    threadline_db::run_migrations(manager.client())
        .await
        .context("apply schema migrations")?;

    let state = AppState::new(manager.client().clone(), config.auth, config.base_domain);
    tracing::info!(base_domain = %state.base_domain, "Ready to authorize requests");

    tokio::signal::ctrl_c()
        .await
        .context("wait for shutdown signal")?;

    tracing::info!("Threadline server stopped.");
    Ok(())
}
