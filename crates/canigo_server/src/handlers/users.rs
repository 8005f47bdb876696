//! User handlers.
//!
//! GET    /users/me          own profile
//! PATCH  /users/me          edit own profile (no role, age or pass level)
//! GET    /users/me/places   places the caller is granted into
//! GET    /users/:id/places  same, addressed by id (owner only)
//! GET    /users             list (admin)
//! POST   /users             create (admin)
//! GET    /users/:id         fetch (admin)
//! PATCH  /users/:id         edit, including role (admin)
//! DELETE /users/:id         remove (admin)

use axum::http::StatusCode;
use axum::{Extension, Json};
use canigo_core::access::Resource;
use canigo_core::error::CanigoError;
use canigo_core::ports::Stores;
use canigo_core::proto::{CreateUserRequest, Data, UserPatch};
use canigo_core::types::{Place, User};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{IdPath, JsonBody};
use crate::state::AppState;

async fn load_user(stores: &Stores, id: Uuid) -> Result<User, AppError> {
    Ok(stores
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| CanigoError::not_found("No user found"))?)
}

/// Validate, check the new pass level exists, apply and persist.
async fn patch_user(stores: &Stores, mut user: User, patch: UserPatch) -> Result<User, AppError> {
    patch.validate()?;
    if let Some(pass_level_id) = patch.pass_level_id {
        if stores.pass_levels.find_by_id(pass_level_id).await?.is_none() {
            return Err(CanigoError::invalid_input(format!(
                "pass level {pass_level_id} does not exist"
            ))
            .into());
        }
    }
    patch.apply(&mut user);
    stores.users.update(&user).await?;
    Ok(user)
}

// ── Self-service ──────────────────────────────────────────────

pub async fn get_me(Extension(user): Extension<User>) -> Json<Data<User>> {
    Json(Data::new(user))
}

pub async fn update_me(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<User>,
    JsonBody(patch): JsonBody<UserPatch>,
) -> Result<Json<Data<User>>, AppError> {
    if let Some(field) = patch.admin_only_field() {
        return Err(CanigoError::forbidden(format!("You cannot change your own {field}")).into());
    }
    let user = patch_user(&state.stores, user, patch).await?;
    Ok(Json(Data::new(user)))
}

pub async fn my_places(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Data<Vec<Place>>>, AppError> {
    let places = state.engine.accessible_places(&user).await?;
    Ok(Json(Data::new(places)))
}

pub async fn user_places(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<User>,
    IdPath(id): IdPath,
) -> Result<Json<Data<Vec<Place>>>, AppError> {
    state
        .engine
        .require_ownership(&user, Resource::User(id))
        .await?;
    let places = state.engine.accessible_places(&user).await?;
    Ok(Json(Data::new(places)))
}

// ── Administration ────────────────────────────────────────────

pub async fn list_users(
    Extension(state): Extension<AppState>,
) -> Result<Json<Data<Vec<User>>>, AppError> {
    Ok(Json(Data::new(state.stores.users.list().await?)))
}

pub async fn create_user(
    Extension(state): Extension<AppState>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<Data<User>>), AppError> {
    let user = state.accounts.create_user(req).await?;
    Ok((StatusCode::CREATED, Json(Data::new(user))))
}

pub async fn get_user(
    Extension(state): Extension<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<Data<User>>, AppError> {
    Ok(Json(Data::new(load_user(&state.stores, id).await?)))
}

pub async fn update_user(
    Extension(state): Extension<AppState>,
    IdPath(id): IdPath,
    JsonBody(patch): JsonBody<UserPatch>,
) -> Result<Json<Data<User>>, AppError> {
    let user = load_user(&state.stores, id).await?;
    let user = patch_user(&state.stores, user, patch).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "user updated by admin");
    Ok(Json(Data::new(user)))
}

pub async fn delete_user(
    Extension(state): Extension<AppState>,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    if !state.stores.users.delete(id).await? {
        return Err(CanigoError::not_found("No user found").into());
    }
    tracing::info!(user_id = %id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
