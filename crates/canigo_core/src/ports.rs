//! Port traits. Implemented by canigo_postgres (and the in-memory store in
//! `crate::memory`); core logic depends only on these traits.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CanigoError;
use crate::types::{PassLevel, Place, User};

pub type Result<T> = std::result::Result<T, CanigoError>;

// ── Credential store ──────────────────────────────────────────
//
// Every call is an independent single-record operation. No method is
// retried by the caller; a `Store` error surfaces as-is.

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Find the user holding `token_hash` whose reset window is still open
    /// at `now`.
    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>>;

    async fn list(&self) -> Result<Vec<User>>;

    /// Fails with `Conflict` when the email is already taken.
    async fn insert(&self, user: &User) -> Result<()>;

    /// Full-record replace. Fails with `NotFound` when the id is unknown.
    async fn update(&self, user: &User) -> Result<()>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait PassLevelStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PassLevel>>;

    async fn list(&self) -> Result<Vec<PassLevel>>;

    /// Fails with `Conflict` when the level name is already taken.
    async fn insert(&self, pass: &PassLevel) -> Result<()>;

    async fn update(&self, pass: &PassLevel) -> Result<()>;

    /// Fails with `Conflict` while any user still holds the level. Places
    /// that accept it are not checked. Returns `false` when nothing was
    /// deleted.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait PlaceStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Place>>;

    async fn list(&self) -> Result<Vec<Place>>;

    /// Fails with `Conflict` when the address is already taken.
    async fn insert(&self, place: &Place) -> Result<()>;

    async fn update(&self, place: &Place) -> Result<()>;

    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// The three store handles, shared between the engine, the account service
/// and the HTTP handlers.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub pass_levels: Arc<dyn PassLevelStore>,
    pub places: Arc<dyn PlaceStore>,
}

// ── Email ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Fails with `Delivery` when the message could not be handed off.
    async fn send(&self, email: Email) -> Result<()>;
}

/// Writes outgoing mail to the log instead of a transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, email: Email) -> Result<()> {
        tracing::info!(to = %email.to, subject = %email.subject, "email queued: {}", email.body);
        Ok(())
    }
}

// ── Clock ─────────────────────────────────────────────────────

/// Time source for token timestamps, expiry checks and reset windows.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant, movable by tests.
#[derive(Debug)]
pub struct FixedClock(std::sync::Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(std::sync::Mutex::new(now))
    }

    /// Unix seconds convenience.
    pub fn at_secs(secs: i64) -> Self {
        Self::at(DateTime::from_timestamp(secs, 0).unwrap_or_default())
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap_or_else(|p| p.into_inner()) = now;
    }

    pub fn set_secs(&self, secs: i64) {
        self.set(DateTime::from_timestamp(secs, 0).unwrap_or_default());
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(|p| p.into_inner())
    }
}
