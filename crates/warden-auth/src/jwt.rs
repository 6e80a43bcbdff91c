//! JWT token issuance and validation

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use crate::error::AuthError;
use crate::principal::{Principal, Role};

/// Default token lifetime
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Immutable signing configuration, resolved once at startup
#[derive(Clone)]
pub struct SigningConfig {
    secret: String,
    issuer: String,
    audience: String,
    token_ttl: Duration,
}

impl SigningConfig {
    /// Build a signing configuration; every value must be non-empty
    pub fn new(
        secret: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let (secret, issuer, audience) = (secret.into(), issuer.into(), audience.into());

        if secret.trim().is_empty() {
            return Err(AuthError::MissingSigningConfiguration("signing secret"));
        }
        if issuer.trim().is_empty() {
            return Err(AuthError::MissingSigningConfiguration("issuer"));
        }
        if audience.trim().is_empty() {
            return Err(AuthError::MissingSigningConfiguration("audience"));
        }

        Ok(Self {
            secret,
            issuer,
            audience,
            token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
        })
    }

    pub fn with_token_ttl(mut self, token_ttl: Duration) -> Self {
        self.token_ttl = token_ttl;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }
}

impl fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (principal ID)
    pub sub: String,
    /// Username
    pub name: String,
    /// Principal role
    pub role: Role,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token ID
    pub jti: String,
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT manager for token generation and validation
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    token_ttl: Duration,
}

impl JwtManager {
    /// Create a new JWT manager
    pub fn new(config: &SigningConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            token_ttl: config.token_ttl,
        }
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Generate a JWT token for an authenticated principal
    pub fn generate_token(&self, principal: &Principal) -> Result<IssuedToken, AuthError> {
        self.issue(principal.id(), principal.username(), principal.role())
    }

    /// Sign a token for the given identity
    pub fn issue(
        &self,
        subject_id: &str,
        subject_name: &str,
        role: Role,
    ) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.token_ttl).ok_or_else(|| {
            AuthError::InvalidTokenLifetime(format!("{} hours", self.token_ttl.num_hours()))
        })?;

        let claims = Claims {
            sub: subject_id.to_string(),
            name: subject_name.to_string(),
            role,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        debug!("Generating token for {} {}", role, subject_name);

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validate a JWT token and return its claims
    ///
    /// Checks run in a fixed order: signature and structure, issuer,
    /// audience, then expiry.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["sub", "iss", "aud", "exp"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                debug!("Token rejected at signature check: {}", e);
                AuthError::InvalidSignature
            })?
            .claims;

        if claims.iss != self.issuer {
            return Err(AuthError::InvalidIssuer);
        }

        if claims.aud != self.audience {
            return Err(AuthError::InvalidAudience);
        }

        if Utc::now().timestamp() >= claims.exp {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }
}
