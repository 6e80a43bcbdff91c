//! Database models

use crate::utils::parse_datetime_or_now;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing models from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidStore(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidStore(s) => write!(f, "Invalid credential store: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// The two disjoint credential collections
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStore {
    Admins,
    Users,
}

impl CredentialStore {
    /// Every store, in lookup priority order
    pub const ALL: [CredentialStore; 2] = [CredentialStore::Admins, CredentialStore::Users];

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialStore::Admins => "admins",
            CredentialStore::Users => "users",
        }
    }

    /// Backing table name
    pub(crate) fn table(&self) -> &'static str {
        // Only these literals are ever interpolated into SQL.
        match self {
            CredentialStore::Admins => "admins",
            CredentialStore::Users => "users",
        }
    }
}

impl fmt::Display for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialStore {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" | "admins" => Ok(CredentialStore::Admins),
            "user" | "users" => Ok(CredentialStore::Users),
            _ => Err(ParseError::InvalidStore(s.to_string())),
        }
    }
}

/// Stored credential record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Opaque identifier (UUID v4 text)
    pub id: String,
    pub username: String,
    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New credential (for insertion)
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub username: String,
    pub password_hash: String,
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for Credential {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Credential {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_from_str() {
        assert_eq!("admin".parse::<CredentialStore>().unwrap(), CredentialStore::Admins);
        assert_eq!("Users".parse::<CredentialStore>().unwrap(), CredentialStore::Users);
        assert!("guests".parse::<CredentialStore>().is_err());
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(CredentialStore::ALL[0], CredentialStore::Admins);
        assert_eq!(CredentialStore::ALL[1], CredentialStore::Users);
    }
}
