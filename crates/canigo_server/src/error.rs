//! HTTP mapping for core errors. Every failure body is `{"error": "..."}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use canigo_core::error::{CanigoError, ErrorKind};

/// Message sent in place of store and internal failures.
pub const GENERIC_MESSAGE: &str = "Something went wrong. Please try again later";

#[derive(Debug)]
pub struct AppError(pub CanigoError);

impl From<CanigoError> for AppError {
    fn from(err: CanigoError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = match self.0.kind() {
            ErrorKind::Store | ErrorKind::Internal => {
                tracing::error!(error = ?self.0, "request failed");
                GENERIC_MESSAGE.to_string()
            }
            ErrorKind::Delivery => {
                tracing::warn!(error = %self.0, "request failed");
                self.0.message().to_string()
            }
            _ => {
                tracing::debug!(error = %self.0, "request rejected");
                self.0.message().to_string()
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
