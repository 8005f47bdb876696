//! Pass level handlers.
//!
//! GET    /pass       list
//! GET    /pass/:id   fetch
//! POST   /pass       create (admin)
//! PATCH  /pass/:id   edit (owner)
//! DELETE /pass/:id   remove (owner)

use axum::http::StatusCode;
use axum::{Extension, Json};
use canigo_core::access::Resource;
use canigo_core::error::CanigoError;
use canigo_core::ports::Clock;
use canigo_core::proto::{Data, NewPassLevel, PassLevelPatch};
use canigo_core::types::{PassLevel, User};

use crate::error::AppError;
use crate::extract::{IdPath, JsonBody};
use crate::state::AppState;

pub async fn list_pass_levels(
    Extension(state): Extension<AppState>,
) -> Result<Json<Data<Vec<PassLevel>>>, AppError> {
    Ok(Json(Data::new(state.stores.pass_levels.list().await?)))
}

pub async fn get_pass_level(
    Extension(state): Extension<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<Data<PassLevel>>, AppError> {
    let pass = state
        .stores
        .pass_levels
        .find_by_id(id)
        .await?
        .ok_or_else(|| CanigoError::not_found("No pass level found"))?;
    Ok(Json(Data::new(pass)))
}

pub async fn create_pass_level(
    Extension(state): Extension<AppState>,
    JsonBody(req): JsonBody<NewPassLevel>,
) -> Result<(StatusCode, Json<Data<PassLevel>>), AppError> {
    req.validate()?;
    let pass = req.into_pass_level(state.clock.now());
    state.stores.pass_levels.insert(&pass).await?;
    tracing::info!(pass_level_id = %pass.id, level = %pass.level, "pass level created");
    Ok((StatusCode::CREATED, Json(Data::new(pass))))
}

pub async fn update_pass_level(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<User>,
    IdPath(id): IdPath,
    JsonBody(patch): JsonBody<PassLevelPatch>,
) -> Result<Json<Data<PassLevel>>, AppError> {
    state
        .engine
        .require_ownership(&user, Resource::PassLevel(id))
        .await?;
    patch.validate()?;

    let mut pass = state
        .stores
        .pass_levels
        .find_by_id(id)
        .await?
        .ok_or_else(|| CanigoError::not_found("No pass level found"))?;
    patch.apply(&mut pass, state.clock.now());
    state.stores.pass_levels.update(&pass).await?;
    Ok(Json(Data::new(pass)))
}

pub async fn delete_pass_level(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<User>,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    state
        .engine
        .require_ownership(&user, Resource::PassLevel(id))
        .await?;
    if !state.stores.pass_levels.delete(id).await? {
        return Err(CanigoError::not_found("No pass level found").into());
    }
    tracing::info!(pass_level_id = %id, "pass level deleted");
    Ok(StatusCode::NO_CONTENT)
}
