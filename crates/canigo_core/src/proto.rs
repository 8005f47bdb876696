//! Request / response shapes shared by the server and its clients.
//!
//! Every request type has a `validate()` that rejects malformed shapes with
//! `InvalidInput` before anything reaches the stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::DenialReason;
use crate::error::CanigoError;
use crate::types::{PassLevel, Place, Role, User};

pub const MIN_PASSWORD_LEN: usize = 8;

type Result<T> = std::result::Result<T, CanigoError>;

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CanigoError::invalid_input(format!("{field} must not be empty")));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<()> {
    require_non_empty("email", email)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(CanigoError::invalid_input(format!("{email} is not a valid email"))),
    }
}

/// Length and confirmation rule applied to every password write.
pub fn check_new_password(password: &str, confirm: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CanigoError::invalid_input(format!(
            "password must have at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password != confirm {
        return Err(CanigoError::invalid_input("Passwords are not the same"));
    }
    Ok(())
}

// ── Accounts ──────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub age: u32,
    pub phone_number: String,
    #[serde(default)]
    pub address: Option<String>,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub pass_level_id: Uuid,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<()> {
        check_email(&self.email)?;
        require_non_empty("phone_number", &self.phone_number)?;
        check_new_password(&self.password, &self.password_confirm)
    }
}

/// Admin-side user creation; same shape as signup plus an optional role.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    #[serde(flatten)]
    pub account: SignupRequest,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Both fields optional on the wire so a missing one is a 400, not a
/// deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub password_confirm: String,
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> Result<()> {
        check_new_password(&self.password, &self.password_confirm)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

impl UpdatePasswordRequest {
    pub fn validate(&self) -> Result<()> {
        check_new_password(&self.new_password, &self.new_password_confirm)
    }
}

/// Partial user update. `role`, `age` and `pass_level_id` feed authorization
/// and place access, so only the admin route may set them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<u32>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub pass_level_id: Option<Uuid>,
}

impl UserPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(email) = &self.email {
            check_email(email)?;
        }
        if let Some(phone) = &self.phone_number {
            require_non_empty("phone_number", phone)?;
        }
        Ok(())
    }

    /// First field in this patch that only an admin may change, if any.
    pub fn admin_only_field(&self) -> Option<&'static str> {
        if self.role.is_some() {
            Some("role")
        } else if self.pass_level_id.is_some() {
            Some("pass level")
        } else if self.age.is_some() {
            Some("age")
        } else {
            None
        }
    }

    pub fn apply(self, user: &mut User) {
        if let Some(v) = self.first_name {
            user.first_name = Some(v);
        }
        if let Some(v) = self.last_name {
            user.last_name = Some(v);
        }
        if let Some(v) = self.age {
            user.age = v;
        }
        if let Some(v) = self.phone_number {
            user.phone_number = v;
        }
        if let Some(v) = self.address {
            user.address = Some(v);
        }
        if let Some(v) = self.email {
            user.email = v;
        }
        if let Some(v) = self.role {
            user.role = v;
        }
        if let Some(v) = self.pass_level_id {
            user.pass_level_id = v;
        }
    }
}

/// Returned by signup, login, reset and update-password.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

// ── Pass levels ───────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct NewPassLevel {
    pub level: String,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
}

impl NewPassLevel {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("level", &self.level)
    }

    pub fn into_pass_level(self, now: DateTime<Utc>) -> PassLevel {
        PassLevel {
            id: Uuid::new_v4(),
            level: self.level,
            owner_id: self.owner_id,
            created_at: now,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PassLevelPatch {
    pub level: Option<String>,
    pub owner_id: Option<Uuid>,
}

impl PassLevelPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(level) = &self.level {
            require_non_empty("level", level)?;
        }
        Ok(())
    }

    /// Applies the patch and stamps `updated_at`.
    pub fn apply(self, pass: &mut PassLevel, now: DateTime<Utc>) {
        if let Some(v) = self.level {
            pass.level = v;
        }
        if let Some(v) = self.owner_id {
            pass.owner_id = Some(v);
        }
        pass.updated_at = Some(now);
    }
}

// ── Places ────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct NewPlace {
    pub address: String,
    pub phone_number: String,
    pub age_require: u32,
    pub pass_level_ids: Vec<Uuid>,
}

impl NewPlace {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("address", &self.address)?;
        require_non_empty("phone_number", &self.phone_number)?;
        if self.pass_level_ids.is_empty() {
            return Err(CanigoError::invalid_input(
                "a place must accept at least one pass level",
            ));
        }
        Ok(())
    }

    pub fn into_place(self, owner_id: Uuid) -> Place {
        Place {
            id: Uuid::new_v4(),
            address: self.address,
            phone_number: self.phone_number,
            age_require: self.age_require,
            pass_level_ids: self.pass_level_ids,
            owner_id: Some(owner_id),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlacePatch {
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub age_require: Option<u32>,
    pub pass_level_ids: Option<Vec<Uuid>>,
}

impl PlacePatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(address) = &self.address {
            require_non_empty("address", address)?;
        }
        if let Some(phone) = &self.phone_number {
            require_non_empty("phone_number", phone)?;
        }
        if matches!(&self.pass_level_ids, Some(ids) if ids.is_empty()) {
            return Err(CanigoError::invalid_input(
                "a place must accept at least one pass level",
            ));
        }
        Ok(())
    }

    pub fn apply(self, place: &mut Place) {
        if let Some(v) = self.address {
            place.address = v;
        }
        if let Some(v) = self.phone_number {
            place.phone_number = v;
        }
        if let Some(v) = self.age_require {
            place.age_require = v;
        }
        if let Some(v) = self.pass_level_ids {
            place.pass_level_ids = v;
        }
    }
}

/// Advisory answer for `GET /place/:id/access`. Always a 200.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceAccessResponse {
    pub place_id: Uuid,
    pub granted: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<DenialReason>,
}

/// `{ "data": … }` envelope used by every successful read/write.
#[derive(Debug, Clone, Serialize)]
pub struct Data<T> {
    pub data: T,
}

impl<T> Data<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
