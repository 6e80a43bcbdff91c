//! Database repository implementation

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbError;
use crate::models::CredentialStore;

// Submodules
mod credentials;

/// Database connection and operations
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(database_url: &str) -> Result<Self, DbError> {
        info!("Connecting to credential database: {}", database_url);

        let pool = SqlitePool::connect(database_url).await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Get the underlying pool for advanced usage
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations
    ///
    /// Both stores share one schema. The UNIQUE constraint indexes `username`
    /// with SQLite's default BINARY collation, so lookups are case-sensitive.
    async fn run_migrations(&self) -> Result<(), DbError> {
        info!("Running database migrations");

        for store in CredentialStore::ALL {
            let table = store.table();

            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY,
                    username TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )
                "#
            ))
            .execute(&self.pool)
            .await
            .map_err(|source| DbError::Migration { table, source })?;
        }

        info!("Database migrations completed");
        Ok(())
    }
}
