//! Token service: issues and verifies HS256 identity tokens.
//!
//! Expiry is checked here against the injected [`Clock`] rather than by
//! jsonwebtoken's wall-clock check, so issue/verify are a pure function of
//! secret + clock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{CanigoError, ErrorKind};
use crate::ports::Clock;

pub type Result<T> = std::result::Result<T, CanigoError>;

/// Claims carried by every token we issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Identity id.
    pub sub: Uuid,
    /// Issued at, unix seconds.
    pub iat: i64,
    /// Expires at, unix seconds.
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expires_in: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let expires_in = chrono::Duration::from_std(config.jwt_expires_in)
            .unwrap_or_else(|_| chrono::Duration::seconds(i64::from(u32::MAX)));

        Self {
            encoding: EncodingKey::from_secret(&config.jwt_secret),
            decoding: DecodingKey::from_secret(&config.jwt_secret),
            validation,
            expires_in,
            clock,
        }
    }

    /// Sign a token for `subject`, valid from now for the configured expiry.
    pub fn issue(&self, subject: Uuid) -> Result<IssuedToken> {
        let issued_at = self.clock.now();
        let expires_at = issued_at
            .checked_add_signed(self.expires_in)
            .ok_or_else(|| CanigoError::new(ErrorKind::Internal, "token expiry out of range"))?;
        let claims = TokenClaims {
            sub: subject,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| CanigoError::internal("could not sign token", e))?;
        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Check signature, shape and expiry. Every failure is `Unauthenticated`.
    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            CanigoError::unauthenticated("Invalid token. Please log in again").with_cause(e)
        })?;

        let now = self.clock.now().timestamp();
        if data.claims.exp <= now {
            tracing::debug!(sub = %data.claims.sub, exp = data.claims.exp, now, "token expired");
            return Err(CanigoError::unauthenticated(
                "Token expired. Please log in again",
            ));
        }
        Ok(data.claims)
    }
}
