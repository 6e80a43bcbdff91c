//! Credential verification across ranked principal stores

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::error::AuthError;
use crate::password::verify_password;
use crate::principal::Principal;
use crate::provider::PrincipalProvider;

/// Default bound on a single store lookup
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Valid Argon2 hash that never matches; verified when no store knows the
/// username so both failure paths cost one hash.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

/// Decides which principal, if any, a username/password pair authenticates
///
/// Providers are consulted in the order given. The first provider that knows
/// the username decides the outcome: a wrong password there fails the login
/// even if a later provider holds the same username.
#[derive(Clone)]
pub struct CredentialVerifier {
    providers: Vec<Arc<dyn PrincipalProvider>>,
    lookup_timeout: Duration,
}

impl CredentialVerifier {
    /// Create a verifier over providers in priority order
    pub fn new(providers: Vec<Arc<dyn PrincipalProvider>>) -> Self {
        Self {
            providers,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_lookup_timeout(mut self, lookup_timeout: Duration) -> Self {
        self.lookup_timeout = lookup_timeout;
        self
    }

    /// Authenticate a username and password
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthError> {
        for provider in &self.providers {
            let Some(principal) = self.lookup(provider.as_ref(), username).await? else {
                debug!("No {} principal named {}", provider.role(), username);
                continue;
            };

            if verify_password(password, principal.password_hash())? {
                info!("{} {} authenticated", principal.role(), principal.username());
                return Ok(principal);
            }

            debug!("Password mismatch for {} {}", principal.role(), username);
            return Err(AuthError::InvalidCredentials);
        }

        if let Err(e) = verify_password(password, DUMMY_HASH) {
            error!("Dummy hash verification failed: {}", e);
        }
        debug!("No principal found for {}", username);
        Err(AuthError::InvalidCredentials)
    }

    async fn lookup(
        &self,
        provider: &dyn PrincipalProvider,
        username: &str,
    ) -> Result<Option<Principal>, AuthError> {
        tokio::time::timeout(self.lookup_timeout, provider.find(username))
            .await
            .map_err(|_| {
                AuthError::StoreUnavailable(format!(
                    "{} lookup timed out after {:?}",
                    provider.role(),
                    self.lookup_timeout
                ))
            })?
    }
}
