//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Auth error: {0}")]
    Auth(#[from] warden_auth::AuthError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            // Auth errors carry their own uniform status and body
            ApiError::Auth(e) => return e.into_response(),
            ApiError::BadRequest(msg) => {
                debug!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
        };

        let body = axum::Json(json!({
            "message": message
        }));

        (status, body).into_response()
    }
}
