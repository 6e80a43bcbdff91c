//! Login route and authentication extractors

use axum::{
    Json, Router,
    extract::{FromRef, FromRequestParts, State, rejection::JsonRejection},
    http::request::Parts,
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use tracing::{debug, info};
use warden_auth::{AdminOnly, AuthUser, RolePolicy, UserOnly, authorize};

use crate::error::ApiError;
use crate::state::AppState;

// ==================== Types ====================

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "userName", alias = "UserName")]
    pub username: String,
    #[serde(alias = "Password")]
    pub password: String,
}

/// Login response
#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

// ==================== Auth Extractors ====================

/// Extractor for an authenticated principal of any role
pub struct RequireAuth(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let user = AuthUser::from_headers(&parts.headers, &app_state.jwt)?;
        Ok(RequireAuth(user))
    }
}

/// Extractor for an authenticated principal whose role satisfies `P`
///
/// Missing or invalid tokens reject with 401, a valid token with the wrong
/// role with 403.
pub struct RequireRole<P: RolePolicy>(pub AuthUser, PhantomData<P>);

impl<P: RolePolicy> RequireRole<P> {
    pub fn user(&self) -> &AuthUser {
        &self.0
    }
}

impl<S, P> FromRequestParts<S> for RequireRole<P>
where
    AppState: FromRef<S>,
    S: Send + Sync,
    P: RolePolicy,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        authorize(&user, P::ROLES)?;
        Ok(RequireRole(user, PhantomData))
    }
}

/// Administrators only
pub type RequireAdmin = RequireRole<AdminOnly>;

/// Standard users only
pub type RequireUser = RequireRole<UserOnly>;

// ==================== Input Validation ====================

/// Maximum allowed username length in bytes
const MAX_USERNAME_LENGTH: usize = 64;
/// Maximum allowed password length in bytes (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;

/// Reject oversized input before touching the stores
fn validate_login_input(request: &LoginRequest) -> Result<(), ApiError> {
    if request.username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Username exceeds maximum length of {} bytes",
            MAX_USERNAME_LENGTH
        )));
    }
    if request.password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} bytes",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

// ==================== Auth Routes ====================

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    validate_login_input(&request)?;

    debug!("Login attempt for user: {}", request.username);

    let principal = match state
        .verifier
        .authenticate(&request.username, &request.password)
        .await
    {
        Ok(principal) => principal,
        Err(e) => {
            metrics::counter!("warden_logins_total", "outcome" => e.reason()).increment(1);
            return Err(e.into());
        }
    };

    let issued = state.jwt.generate_token(&principal)?;

    metrics::counter!("warden_logins_total", "outcome" => "success").increment(1);
    info!(
        "{} {} logged in; token expires at {}",
        principal.role(),
        principal.username(),
        issued.expires_at
    );

    Ok(Json(LoginResponse {
        token: issued.token,
    }))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}
