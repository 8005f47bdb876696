//! Password hashing and reset tokens.
//!
//! bcrypt is CPU-bound, so both hash and verify run on the blocking pool to
//! keep other in-flight requests moving.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::CanigoError;

pub type Result<T> = std::result::Result<T, CanigoError>;

const RESET_TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| CanigoError::internal("password hashing task failed", e))?
            .map_err(|e| CanigoError::internal("could not hash password", e))
    }

    /// `false` for a wrong password; an unreadable stored hash is treated the
    /// same way so a corrupt record cannot be logged into.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| CanigoError::internal("password verification task failed", e))?;
        match outcome {
            Ok(ok) => Ok(ok),
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash is unreadable");
                Ok(false)
            }
        }
    }
}

/// A freshly generated reset token: `raw` goes into the emailed link,
/// `digest` is what gets stored.
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub raw: String,
    pub digest: String,
}

impl ResetToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; RESET_TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let raw = hex::encode(bytes);
        let digest = digest_reset_token(&raw);
        Self { raw, digest }
    }
}

/// SHA-256 hex of a raw reset token, as stored on the user record.
pub fn digest_reset_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
