//! Principal providers
//!
//! A provider answers "is there a principal with this username?" for one
//! credential store. The verifier holds several providers and consults them
//! in a fixed priority order.

use async_trait::async_trait;
use std::collections::HashMap;
use warden_db::{Credential, CredentialStore, Database};

use crate::error::AuthError;
use crate::principal::{Principal, Role};

/// Lookup of principals by username
#[async_trait]
pub trait PrincipalProvider: Send + Sync {
    /// Role assigned to every principal this provider returns
    fn role(&self) -> Role;

    /// Find at most one principal with exactly this username
    async fn find(&self, username: &str) -> Result<Option<Principal>, AuthError>;
}

/// Provider backed by one of the SQLite credential stores
#[derive(Clone)]
pub struct StoreDirectory {
    db: Database,
    store: CredentialStore,
}

impl StoreDirectory {
    pub fn new(db: Database, store: CredentialStore) -> Self {
        Self { db, store }
    }

    pub fn admins(db: Database) -> Self {
        Self::new(db, CredentialStore::Admins)
    }

    pub fn users(db: Database) -> Self {
        Self::new(db, CredentialStore::Users)
    }
}

#[async_trait]
impl PrincipalProvider for StoreDirectory {
    fn role(&self) -> Role {
        Role::from(self.store)
    }

    async fn find(&self, username: &str) -> Result<Option<Principal>, AuthError> {
        let credential = self
            .db
            .find_credential(self.store, username)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        Ok(credential.map(|c| Principal::from_store(self.store, c)))
    }
}

/// In-memory provider, keyed by username
#[derive(Clone)]
pub struct StaticDirectory {
    role: Role,
    entries: HashMap<String, Credential>,
}

impl StaticDirectory {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            entries: HashMap::new(),
        }
    }

    /// Add a credential, replacing any previous one with the same username
    pub fn with(mut self, credential: Credential) -> Self {
        self.entries.insert(credential.username.clone(), credential);
        self
    }
}

#[async_trait]
impl PrincipalProvider for StaticDirectory {
    fn role(&self) -> Role {
        self.role
    }

    async fn find(&self, username: &str) -> Result<Option<Principal>, AuthError> {
        let store = self.role.store();
        Ok(self
            .entries
            .get(username)
            .cloned()
            .map(|c| Principal::from_store(store, c)))
    }
}
