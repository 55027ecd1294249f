//! HTTP surface for trusted callers.
//!
//! Errors are mapped to status codes in one place (`ApiError`).

pub mod broadcast;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use wsrelay_core::error::RelayError;

/// HTTP wrapper around `RelayError`.
#[derive(Debug)]
pub struct ApiError(pub RelayError);

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RelayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::AuthFailed => StatusCode::UNAUTHORIZED,
            RelayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            RelayError::Transport(_)
            | RelayError::UnsupportedVersion
            | RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "error": self.0.client_code().as_str(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
