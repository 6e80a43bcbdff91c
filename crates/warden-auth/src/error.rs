//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// Client-facing message for every failed login
pub const INVALID_LOGIN_MESSAGE: &str = "Invalid username or password";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Missing signing configuration: {0}")]
    MissingSigningConfiguration(&'static str),

    #[error("Token lifetime out of range: {0}")]
    InvalidTokenLifetime(String),

    #[error("Invalid token signature or structure")]
    InvalidSignature,

    #[error("Invalid token issuer")]
    InvalidIssuer,

    #[error("Invalid token audience")]
    InvalidAudience,

    #[error("Token expired")]
    TokenExpired,

    #[error("Missing authorization header")]
    MissingAuthHeader,

    #[error("Invalid authorization header format")]
    InvalidAuthHeader,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// Short label for diagnostics and metrics
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::StoreUnavailable(_) => "store_unavailable",
            AuthError::MissingSigningConfiguration(_) => "missing_signing_configuration",
            AuthError::InvalidTokenLifetime(_) => "invalid_token_lifetime",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::TokenExpired => "expired",
            AuthError::MissingAuthHeader => "missing_header",
            AuthError::InvalidAuthHeader => "invalid_header",
            AuthError::Forbidden => "forbidden",
            AuthError::PasswordHash(_) => "password_hash",
            AuthError::Jwt(_) => "jwt",
        }
    }

    /// Whether this error came from checking a presented bearer token
    pub fn is_token_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidSignature
                | AuthError::InvalidIssuer
                | AuthError::InvalidAudience
                | AuthError::TokenExpired
                | AuthError::MissingAuthHeader
                | AuthError::InvalidAuthHeader
        )
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // The body never says which check failed
        let (status, message) = match &self {
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, INVALID_LOGIN_MESSAGE),
            AuthError::InvalidSignature
            | AuthError::InvalidIssuer
            | AuthError::InvalidAudience
            | AuthError::TokenExpired
            | AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            AuthError::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable")
            }
            AuthError::MissingSigningConfiguration(_)
            | AuthError::InvalidTokenLifetime(_)
            | AuthError::PasswordHash(_)
            | AuthError::Jwt(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
        };

        if status.is_server_error() {
            error!(reason = self.reason(), "Authentication failure: {}", self);
        } else {
            debug!(reason = self.reason(), "Request rejected: {}", self);
        }

        if self.is_token_rejection() {
            metrics::counter!("warden_token_rejections_total", "reason" => self.reason())
                .increment(1);
        }

        let body = axum::Json(json!({
            "message": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_failures_share_status() {
        for err in [
            AuthError::InvalidSignature,
            AuthError::InvalidIssuer,
            AuthError::InvalidAudience,
            AuthError::TokenExpired,
            AuthError::MissingAuthHeader,
        ] {
            assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_forbidden_and_store_status() {
        assert_eq!(
            AuthError::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::StoreUnavailable("timeout".into())
                .into_response()
                .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
