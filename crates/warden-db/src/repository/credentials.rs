//! Credential operations

use chrono::Utc;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{Credential, CredentialStore, NewCredential};
use crate::repository::Database;

impl Database {
    // ==================== Credential Operations ====================

    /// Insert a new credential into the given store
    pub async fn insert_credential(
        &self,
        store: CredentialStore,
        credential: NewCredential,
    ) -> Result<Credential, DbError> {
        let now = Utc::now();

        if self
            .find_credential(store, &credential.username)
            .await?
            .is_some()
        {
            return Err(DbError::Duplicate {
                store: store.as_str(),
                username: credential.username,
            });
        }

        let id = Uuid::new_v4().to_string();

        sqlx::query(&format!(
            r#"
            INSERT INTO {} (id, username, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
            store.table()
        ))
        .bind(&id)
        .bind(&credential.username)
        .bind(&credential.password_hash)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Credential {
            id,
            username: credential.username,
            password_hash: credential.password_hash,
            created_at: now,
            updated_at: now,
        })
    }

    /// Find a credential by exact username
    pub async fn find_credential(
        &self,
        store: CredentialStore,
        username: &str,
    ) -> Result<Option<Credential>, DbError> {
        let result = sqlx::query(&format!(
            r#"
            SELECT id, username, password_hash, created_at, updated_at
            FROM {}
            WHERE username = ?
            "#,
            store.table()
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| Credential::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// List all credentials in a store
    pub async fn list_credentials(
        &self,
        store: CredentialStore,
    ) -> Result<Vec<Credential>, DbError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT id, username, password_hash, created_at, updated_at
            FROM {}
            ORDER BY username
            "#,
            store.table()
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Credential::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Replace a credential's password hash
    pub async fn update_password(
        &self,
        store: CredentialStore,
        id: &str,
        password_hash: &str,
    ) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(&format!(
            r#"
            UPDATE {}
            SET password_hash = ?, updated_at = ?
            WHERE id = ?
            "#,
            store.table()
        ))
        .bind(password_hash)
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a credential
    pub async fn delete_credential(
        &self,
        store: CredentialStore,
        id: &str,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", store.table()))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Check if a store holds any credentials
    pub async fn has_credentials(&self, store: CredentialStore) -> Result<bool, DbError> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", store.table()))
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}
