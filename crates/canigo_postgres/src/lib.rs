//! PostgreSQL adapter for the Can I Go store ports.

pub mod store;

use std::sync::Arc;

use anyhow::Context;
use canigo_core::ports::Stores;
use sqlx::PgPool;

pub use store::{PgPassLevelStore, PgPlaceStore, PgUserStore};

/// Table definitions; every statement is `IF NOT EXISTS`.
pub const SCHEMA: &str = include_str!("../sql/schema.sql");

/// Create the `canigo` schema and tables when missing.
pub async fn apply_schema(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .context("applying canigo schema")?;
    Ok(())
}

/// Store handles over one shared pool.
pub fn stores(pool: PgPool) -> Stores {
    Stores {
        users: Arc::new(PgUserStore::new(pool.clone())),
        pass_levels: Arc::new(PgPassLevelStore::new(pool.clone())),
        places: Arc::new(PgPlaceStore::new(pool)),
    }
}
