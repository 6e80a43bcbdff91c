//! Access control gate
//!
//! Turns a presented bearer token into an [`AuthUser`] and decides whether
//! that user's role may reach an endpoint.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AuthError;
use crate::jwt::{Claims, JwtManager};
use crate::principal::Role;

/// Authenticated user information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    /// Create from JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.sub.clone(),
            username: claims.name.clone(),
            role: claims.role,
        }
    }

    /// Validate the bearer token in `headers`
    pub fn from_headers(headers: &HeaderMap, jwt: &JwtManager) -> Result<Self, AuthError> {
        let header = headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = extract_bearer_token(header)?;
        let claims = jwt.validate_token(token)?;
        let user = Self::from_claims(&claims);

        debug!("Authenticated user: {} ({})", user.username, user.role);
        Ok(user)
    }
}

/// Extract bearer token from authorization header
///
/// The scheme name is matched case-insensitively.
pub fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    match header.split_once(' ') {
        Some((scheme, token))
            if scheme.eq_ignore_ascii_case("Bearer") && !token.trim().is_empty() =>
        {
            Ok(token.trim())
        }
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

/// Set of roles allowed through a gate
pub trait RolePolicy: Send + Sync + 'static {
    /// Allowed roles; empty means any authenticated principal
    const ROLES: &'static [Role];
}

/// Any authenticated principal
pub struct AnyRole;

impl RolePolicy for AnyRole {
    const ROLES: &'static [Role] = &[];
}

/// Administrators only
pub struct AdminOnly;

impl RolePolicy for AdminOnly {
    const ROLES: &'static [Role] = &[Role::Administrator];
}

/// Standard users only
pub struct UserOnly;

impl RolePolicy for UserOnly {
    const ROLES: &'static [Role] = &[Role::StandardUser];
}

/// Check an authenticated user against the allowed roles
pub fn authorize(user: &AuthUser, allowed: &[Role]) -> Result<(), AuthError> {
    if allowed.is_empty() || allowed.contains(&user.role) {
        return Ok(());
    }

    debug!(
        "User {} with role {} denied; requires one of {:?}",
        user.username, user.role, allowed
    );
    Err(AuthError::Forbidden)
}
