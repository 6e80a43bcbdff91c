//! Authenticated principals and their roles

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use warden_db::{Credential, CredentialStore};

/// Role carried in the token's `role` claim
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    #[serde(rename = "Admin")]
    Administrator,
    #[serde(rename = "User")]
    StandardUser,
}

impl Role {
    /// Claim value
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "Admin",
            Role::StandardUser => "User",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Administrator)
    }

    /// Store whose records carry this role
    pub fn store(&self) -> CredentialStore {
        match self {
            Role::Administrator => CredentialStore::Admins,
            Role::StandardUser => CredentialStore::Users,
        }
    }
}

impl From<CredentialStore> for Role {
    fn from(store: CredentialStore) -> Self {
        match store {
            CredentialStore::Admins => Role::Administrator,
            CredentialStore::Users => Role::StandardUser,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Administrator),
            "User" => Ok(Role::StandardUser),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// A stored credential tagged with the store it was found in
///
/// The role is fixed at lookup time and never re-derived later.
#[derive(Debug, Clone)]
pub enum Principal {
    Admin(Credential),
    User(Credential),
}

impl Principal {
    /// Tag a credential found in `store`
    pub fn from_store(store: CredentialStore, credential: Credential) -> Self {
        match store {
            CredentialStore::Admins => Principal::Admin(credential),
            CredentialStore::Users => Principal::User(credential),
        }
    }

    pub fn credential(&self) -> &Credential {
        match self {
            Principal::Admin(c) | Principal::User(c) => c,
        }
    }

    pub fn id(&self) -> &str {
        &self.credential().id
    }

    pub fn username(&self) -> &str {
        &self.credential().username
    }

    pub fn role(&self) -> Role {
        match self {
            Principal::Admin(_) => Role::Administrator,
            Principal::User(_) => Role::StandardUser,
        }
    }

    pub(crate) fn password_hash(&self) -> &str {
        &self.credential().password_hash
    }
}
