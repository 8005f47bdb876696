//! Account flow handlers.
//!
//! POST  /users/signup                  create an account, returns a token (201)
//! POST  /users/login                   exchange credentials for a token
//! POST  /users/forgot-password         email a reset link
//! PATCH /users/reset-password/:token   set a new password from a reset link
//! PATCH /users/update-password         change password while logged in

use axum::extract::Path;
use axum::http::StatusCode;
use axum::{Extension, Json};
use canigo_core::proto::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest,
    UpdatePasswordRequest,
};
use canigo_core::types::User;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::JsonBody;
use crate::state::AppState;

pub async fn signup(
    Extension(state): Extension<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let resp = state.accounts.signup(req).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

pub async fn login(
    Extension(state): Extension<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    Ok(Json(state.accounts.login(req).await?))
}

pub async fn forgot_password(
    Extension(state): Extension<AppState>,
    JsonBody(req): JsonBody<ForgotPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    state.accounts.forgot_password(&req.email).await?;
    Ok(Json(json!({ "message": "Token sent to email" })))
}

pub async fn reset_password(
    Extension(state): Extension<AppState>,
    Path(token): Path<String>,
    JsonBody(req): JsonBody<ResetPasswordRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    Ok(Json(state.accounts.reset_password(&token, req).await?))
}

pub async fn update_password(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<User>,
    JsonBody(req): JsonBody<UpdatePasswordRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    Ok(Json(state.accounts.update_password(&user, req).await?))
}
