//! Database error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Credential store error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Username '{username}' already exists in the {store} store")]
    Duplicate {
        store: &'static str,
        username: String,
    },

    #[error("Migration failed for table {table}: {source}")]
    Migration {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },
}
