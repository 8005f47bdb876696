//! Authentication settings, built once at startup and handed to the token
//! service and account flows. Nothing in the core reads the environment.

use std::time::Duration;

#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret for HS256 tokens.
    pub jwt_secret: Vec<u8>,
    /// Token lifetime.
    pub jwt_expires_in: Duration,
    /// bcrypt work factor.
    pub bcrypt_cost: u32,
    /// How long a password reset link stays valid.
    pub reset_token_ttl: Duration,
}

impl AuthConfig {
    pub const DEFAULT_EXPIRES_IN: Duration = Duration::from_secs(24 * 60 * 60);
    pub const DEFAULT_BCRYPT_COST: u32 = 10;
    pub const DEFAULT_RESET_TTL: Duration = Duration::from_secs(10 * 60);
    /// Upper bound for token and reset link lifetimes (ten years).
    pub const MAX_LIFETIME: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            jwt_secret: secret.to_vec(),
            jwt_expires_in: Self::DEFAULT_EXPIRES_IN,
            bcrypt_cost: Self::DEFAULT_BCRYPT_COST,
            reset_token_ttl: Self::DEFAULT_RESET_TTL,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expires_in", &self.jwt_expires_in)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("reset_token_ttl", &self.reset_token_ttl)
            .finish()
    }
}
