//! Domain records: pure value types, no DB dependency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. Exact-match only: `Admin` does not imply `User`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// An account, and the authenticated principal once resolved from a token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: u32,
    pub phone_number: String,
    pub address: Option<String>,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub pass_level_id: Uuid,
    pub password_changed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_expires: Option<DateTime<Utc>>,
}

impl User {
    /// True when the password changed after a token issued at `issued_at`
    /// (unix seconds). Compared at whole-second granularity, so a token
    /// issued in the same second as the change is still accepted.
    pub fn password_changed_after(&self, issued_at: i64) -> bool {
        self.password_changed_at
            .map(|changed| issued_at < changed.timestamp())
            .unwrap_or(false)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// An eligibility tier referenced by users and accepted by places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassLevel {
    pub id: Uuid,
    pub level: String,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A venue gated by a minimum age and a set of accepted pass levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub id: Uuid,
    pub address: String,
    pub phone_number: String,
    pub age_require: u32,
    /// Never empty once persisted.
    pub pass_level_ids: Vec<Uuid>,
    pub owner_id: Option<Uuid>,
}

impl Place {
    pub fn accepts(&self, pass_level_id: Uuid) -> bool {
        self.pass_level_ids.contains(&pass_level_id)
    }
}
