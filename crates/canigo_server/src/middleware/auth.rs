//! Authentication layers.
//!
//! `require_login` resolves the bearer token to a [`User`] and inserts it
//! into request extensions. `require_admin` must sit inside it.

use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use axum::Extension;
use canigo_core::access::require_role;
use canigo_core::error::CanigoError;
use canigo_core::types::{Role, User};

use crate::error::AppError;
use crate::state::AppState;

pub async fn require_login(
    Extension(state): Extension<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let user = state.engine.authenticate(header.as_deref()).await?;
    tracing::debug!(user_id = %user.id, "authenticated");
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<User>()
        .ok_or_else(|| CanigoError::unauthenticated("You are not logged in"))?;
    require_role(user, Role::Admin)?;
    Ok(next.run(req).await)
}
