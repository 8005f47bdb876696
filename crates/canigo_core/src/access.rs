//! Access decision engine.
//!
//! Per-request and stateless: every call works on records freshly loaded
//! from the stores. The order is always authenticate → role/ownership →
//! action; ownership takes a resolved `&User`, so it cannot run against a
//! missing identity.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::error::CanigoError;
use crate::ports::Stores;
use crate::token::TokenService;
use crate::types::{Place, Role, User};

pub type Result<T> = std::result::Result<T, CanigoError>;

/// Resources that have an owner. Each variant carries its own predicate in
/// [`AccessEngine::require_ownership`]; there is no catch-all arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User(Uuid),
    PassLevel(Uuid),
    Place(Uuid),
}

impl Resource {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::PassLevel(_) => "pass_level",
            Self::Place(_) => "place",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::User(id) | Self::PassLevel(id) | Self::Place(id) => *id,
        }
    }
}

/// Why a place-access evaluation came back negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenialReason {
    PassLevelNotAccepted { pass_level_id: Uuid },
    UnderAge { age: u32, age_require: u32 },
}

/// Outcome of a place-access evaluation. A denial is a normal answer, not
/// an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceAccess {
    Granted,
    Denied(Vec<DenialReason>),
}

impl PlaceAccess {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Granted iff the place accepts the user's pass level AND the user meets
/// the minimum age. Both predicates are always evaluated so the denial lists
/// every failing one.
pub fn evaluate_place_access(user: &User, place: &Place) -> PlaceAccess {
    let mut reasons = Vec::new();
    if !place.accepts(user.pass_level_id) {
        reasons.push(DenialReason::PassLevelNotAccepted {
            pass_level_id: user.pass_level_id,
        });
    }
    if user.age < place.age_require {
        reasons.push(DenialReason::UnderAge {
            age: user.age,
            age_require: place.age_require,
        });
    }
    if reasons.is_empty() {
        PlaceAccess::Granted
    } else {
        PlaceAccess::Denied(reasons)
    }
}

/// Exact role match; no hierarchy between roles.
pub fn require_role(user: &User, role: Role) -> Result<()> {
    if user.role == role {
        Ok(())
    } else {
        Err(CanigoError::forbidden(format!(
            "{role} role required to access this resource"
        )))
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(raw_header: Option<&str>) -> Option<&str> {
    let (scheme, token) = raw_header?.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

#[derive(Clone)]
pub struct AccessEngine {
    tokens: Arc<TokenService>,
    stores: Stores,
}

impl AccessEngine {
    pub fn new(tokens: Arc<TokenService>, stores: Stores) -> Self {
        Self { tokens, stores }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Resolve the acting user from a raw `Authorization` header.
    ///
    /// Unauthenticated when the header is missing or unparsable, the token
    /// fails verification, the subject no longer exists, or the password
    /// changed after the token was issued.
    pub async fn authenticate(&self, raw_header: Option<&str>) -> Result<User> {
        let token = bearer_token(raw_header)
            .ok_or_else(|| CanigoError::unauthenticated("You are not logged in"))?;
        let claims = self.tokens.verify(token)?;

        let user = self
            .stores
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| {
                CanigoError::unauthenticated("The user belonging to this token no longer exists")
            })?;

        if user.password_changed_after(claims.iat) {
            tracing::debug!(user_id = %user.id, iat = claims.iat, "stale token after password change");
            return Err(CanigoError::unauthenticated(
                "Password changed recently. Please log in again",
            ));
        }

        Ok(user)
    }

    /// Ownership check for one resource. NotFound when the record the
    /// predicate reads is gone, Forbidden when it belongs to someone else.
    ///
    /// Pass-level rights come from the user's own pass level: whoever owns
    /// the level they hold may manage pass levels. The target id is only
    /// used for logging.
    pub async fn require_ownership(&self, user: &User, resource: Resource) -> Result<()> {
        let owner = match resource {
            Resource::User(id) => Some(id),
            Resource::PassLevel(_) => {
                self.stores
                    .pass_levels
                    .find_by_id(user.pass_level_id)
                    .await?
                    .ok_or_else(|| CanigoError::not_found("No pass level found"))?
                    .owner_id
            }
            Resource::Place(id) => {
                self.stores
                    .places
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| CanigoError::not_found("No place found"))?
                    .owner_id
            }
        };

        if owner == Some(user.id) {
            return Ok(());
        }
        tracing::debug!(
            user_id = %user.id,
            kind = resource.kind(),
            resource_id = %resource.id(),
            "ownership check failed"
        );
        Err(CanigoError::forbidden(format!(
            "You are not the owner of this {}",
            resource.kind().replace('_', " ")
        )))
    }

    /// Load a place and evaluate the user against it.
    pub async fn place_access(&self, user: &User, place_id: Uuid) -> Result<(Place, PlaceAccess)> {
        let place = self
            .stores
            .places
            .find_by_id(place_id)
            .await?
            .ok_or_else(|| CanigoError::not_found("No place found"))?;
        let decision = evaluate_place_access(user, &place);
        Ok((place, decision))
    }

    /// Every place the user would be granted into.
    pub async fn accessible_places(&self, user: &User) -> Result<Vec<Place>> {
        let places = self.stores.places.list().await?;
        Ok(places
            .into_iter()
            .filter(|place| evaluate_place_access(user, place).is_granted())
            .collect())
    }
}
