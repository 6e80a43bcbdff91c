//! Warden Authentication and Authorization
//!
//! This crate verifies credentials against the ranked principal stores,
//! issues and validates signed bearer tokens, and provides the role gate
//! used by protected endpoints.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod principal;
pub mod provider;
pub mod verifier;

pub use error::AuthError;
pub use jwt::{Claims, IssuedToken, JwtManager, SigningConfig};
pub use middleware::{AdminOnly, AnyRole, AuthUser, RolePolicy, UserOnly, authorize, extract_bearer_token};
pub use password::{hash_password, verify_password};
pub use principal::{Principal, Role};
pub use provider::{PrincipalProvider, StaticDirectory, StoreDirectory};
pub use verifier::CredentialVerifier;
