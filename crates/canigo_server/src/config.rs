//! Server configuration, read once from the environment at startup.
//!
//!   CANIGO_JWT_SECRET              JWT HMAC secret (required)
//!   CANIGO_JWT_EXPIRES_IN_SECS     token lifetime (default: 86400)
//!   CANIGO_BCRYPT_COST             bcrypt work factor (default: 10)
//!   CANIGO_RESET_TOKEN_TTL_SECS    reset link lifetime (default: 600)
//!   CANIGO_BIND_ADDR               listen address (default: 0.0.0.0:3000)
//!   CANIGO_DATABASE_URL            Postgres URL; in-memory store when unset
//!   CANIGO_DB_MAX_CONNECTIONS      pool size (default: 10)
//!   CANIGO_PUBLIC_URL              base for emailed links (default: http://localhost:3000)

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};
use canigo_core::config::AuthConfig;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub public_url: String,
    pub auth: AuthConfig,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret = get("CANIGO_JWT_SECRET").context("CANIGO_JWT_SECRET must be set")?;
        let mut auth = AuthConfig::from_secret(secret.as_bytes());
        auth.jwt_expires_in = Duration::from_secs(parse_or(
            &get,
            "CANIGO_JWT_EXPIRES_IN_SECS",
            AuthConfig::DEFAULT_EXPIRES_IN.as_secs(),
        )?);
        auth.bcrypt_cost = parse_or(&get, "CANIGO_BCRYPT_COST", AuthConfig::DEFAULT_BCRYPT_COST)?;
        auth.reset_token_ttl = Duration::from_secs(parse_or(
            &get,
            "CANIGO_RESET_TOKEN_TTL_SECS",
            AuthConfig::DEFAULT_RESET_TTL.as_secs(),
        )?);

        if !(4..=31).contains(&auth.bcrypt_cost) {
            bail!("CANIGO_BCRYPT_COST must be between 4 and 31, got {}", auth.bcrypt_cost);
        }
        if auth.jwt_expires_in.is_zero() {
            bail!("CANIGO_JWT_EXPIRES_IN_SECS must be positive");
        }
        let max = AuthConfig::MAX_LIFETIME.as_secs();
        if auth.jwt_expires_in > AuthConfig::MAX_LIFETIME {
            bail!("CANIGO_JWT_EXPIRES_IN_SECS must be at most {max}");
        }
        if auth.reset_token_ttl.is_zero() || auth.reset_token_ttl > AuthConfig::MAX_LIFETIME {
            bail!("CANIGO_RESET_TOKEN_TTL_SECS must be between 1 and {max}");
        }

        Ok(Self {
            bind_addr: get("CANIGO_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            database_url: get("CANIGO_DATABASE_URL"),
            max_connections: parse_or(&get, "CANIGO_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            public_url: get("CANIGO_PUBLIC_URL").unwrap_or_else(|| DEFAULT_PUBLIC_URL.into()),
            auth,
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
