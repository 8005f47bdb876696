//! Router construction for the Can I Go server.

use axum::{
    middleware as axum_mw,
    routing::{get, patch, post},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, health, pass, place, users};
use crate::middleware::auth::{require_admin, require_login};
use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1";

/// Build the full axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    // Routes that need no token
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/users/signup", post(auth::signup))
        .route("/users/login", post(auth::login))
        .route("/users/forgot-password", post(auth::forgot_password))
        .route("/users/reset-password/:token", patch(auth::reset_password))
        .route("/pass", get(pass::list_pass_levels))
        .route("/pass/:id", get(pass::get_pass_level))
        .route("/place", get(place::list_places))
        .route("/place/:id", get(place::get_place));

    // Any logged-in user; ownership is checked inside the handlers
    let authenticated = Router::new()
        .route("/users/update-password", patch(auth::update_password))
        .route("/users/me", get(users::get_me).patch(users::update_me))
        .route("/users/me/places", get(users::my_places))
        .route("/users/:id/places", get(users::user_places))
        .route(
            "/pass/:id",
            patch(pass::update_pass_level).delete(pass::delete_pass_level),
        )
        .route("/place", post(place::create_place))
        .route(
            "/place/:id",
            axum::routing::put(place::update_place).delete(place::delete_place),
        )
        .route("/place/:id/access", get(place::place_access))
        .layer(axum_mw::from_fn(require_login));

    // Admin only. Layers run outermost-last, so login resolves first.
    let admin = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/pass", post(pass::create_pass_level))
        .layer(axum_mw::from_fn(require_admin))
        .layer(axum_mw::from_fn(require_login));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest(API_PREFIX, public.merge(authenticated).merge(admin))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
