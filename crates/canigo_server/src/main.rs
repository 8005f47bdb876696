//! canigo_server: REST server for Can I Go.
//!
//! Configuration comes from the environment (and `.env` when present); see
//! `canigo_server::config` for the variables.

use std::sync::Arc;

use anyhow::Context;
use canigo_core::memory::MemoryStore;
use canigo_core::ports::{LogEmailSender, SystemClock};
use canigo_server::config::ServerConfig;
use canigo_server::router::{build_router, API_PREFIX};
use canigo_server::state::AppState;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,canigo_server=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    tracing::debug!(?config, "configuration loaded");

    let stores = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(url)
                .await
                .context("failed to connect to database")?;
            tracing::info!("Connected to database");
            canigo_postgres::apply_schema(&pool).await?;
            canigo_postgres::stores(pool)
        }
        None => {
            tracing::warn!("CANIGO_DATABASE_URL not set; using the in-memory store");
            Arc::new(MemoryStore::new()).stores()
        }
    };

    let state = AppState::new(
        &config.auth,
        stores,
        Arc::new(LogEmailSender),
        Arc::new(SystemClock),
        &config.public_url,
    );
    let app = build_router(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    tracing::info!("canigo_server listening on {}{API_PREFIX}", config.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
