//! Place handlers.
//!
//! GET    /place              list
//! GET    /place/:id          fetch
//! POST   /place              create; the caller becomes owner
//! PUT    /place/:id          edit (owner)
//! DELETE /place/:id          remove (owner)
//! GET    /place/:id/access   can the caller go there? Always 200.

use axum::http::StatusCode;
use axum::{Extension, Json};
use canigo_core::access::{PlaceAccess, Resource};
use canigo_core::error::CanigoError;
use canigo_core::ports::Stores;
use canigo_core::proto::{Data, NewPlace, PlaceAccessResponse, PlacePatch};
use canigo_core::types::{Place, User};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{IdPath, JsonBody};
use crate::state::AppState;

async fn ensure_pass_levels_exist(stores: &Stores, ids: &[Uuid]) -> Result<(), AppError> {
    for id in ids {
        if stores.pass_levels.find_by_id(*id).await?.is_none() {
            return Err(CanigoError::invalid_input(format!("pass level {id} does not exist")).into());
        }
    }
    Ok(())
}

pub async fn list_places(
    Extension(state): Extension<AppState>,
) -> Result<Json<Data<Vec<Place>>>, AppError> {
    Ok(Json(Data::new(state.stores.places.list().await?)))
}

pub async fn get_place(
    Extension(state): Extension<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<Data<Place>>, AppError> {
    let place = state
        .stores
        .places
        .find_by_id(id)
        .await?
        .ok_or_else(|| CanigoError::not_found("No place found"))?;
    Ok(Json(Data::new(place)))
}

pub async fn create_place(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<User>,
    JsonBody(req): JsonBody<NewPlace>,
) -> Result<(StatusCode, Json<Data<Place>>), AppError> {
    req.validate()?;
    ensure_pass_levels_exist(&state.stores, &req.pass_level_ids).await?;
    let place = req.into_place(user.id);
    state.stores.places.insert(&place).await?;
    tracing::info!(place_id = %place.id, owner_id = %user.id, "place created");
    Ok((StatusCode::CREATED, Json(Data::new(place))))
}

pub async fn update_place(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<User>,
    IdPath(id): IdPath,
    JsonBody(patch): JsonBody<PlacePatch>,
) -> Result<Json<Data<Place>>, AppError> {
    state
        .engine
        .require_ownership(&user, Resource::Place(id))
        .await?;
    patch.validate()?;
    if let Some(ids) = &patch.pass_level_ids {
        ensure_pass_levels_exist(&state.stores, ids).await?;
    }

    let mut place = state
        .stores
        .places
        .find_by_id(id)
        .await?
        .ok_or_else(|| CanigoError::not_found("No place found"))?;
    patch.apply(&mut place);
    state.stores.places.update(&place).await?;
    Ok(Json(Data::new(place)))
}

pub async fn delete_place(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<User>,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    state
        .engine
        .require_ownership(&user, Resource::Place(id))
        .await?;
    if !state.stores.places.delete(id).await? {
        return Err(CanigoError::not_found("No place found").into());
    }
    tracing::info!(place_id = %id, "place deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn place_access(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<User>,
    IdPath(id): IdPath,
) -> Result<Json<PlaceAccessResponse>, AppError> {
    let (place, decision) = state.engine.place_access(&user, id).await?;
    let resp = match decision {
        PlaceAccess::Granted => PlaceAccessResponse {
            place_id: place.id,
            granted: true,
            message: format!("You can go to {}", place.address),
            reasons: Vec::new(),
        },
        PlaceAccess::Denied(reasons) => PlaceAccessResponse {
            place_id: place.id,
            granted: false,
            message: format!("You cannot go to {}", place.address),
            reasons,
        },
    };
    Ok(Json(resp))
}
