//! Credential provisioning: first-run admin seeding and the `add-principal` command

use anyhow::{Context, Result, bail};
use tracing::{info, warn};
use warden_auth::hash_password;
use warden_db::{Credential, CredentialStore, Database, NewCredential};

use crate::config::BootstrapConfig;

/// Hash `password` and store a new principal in `store`
pub async fn add_principal(
    db: &Database,
    store: CredentialStore,
    username: &str,
    password: &str,
) -> Result<Credential> {
    if username.is_empty() {
        bail!("Username must not be empty");
    }
    if password.trim().is_empty() {
        bail!("Password must not be empty");
    }

    let password_hash = hash_password(password)?;
    let credential = db
        .insert_credential(
            store,
            NewCredential {
                username: username.to_string(),
                password_hash,
            },
        )
        .await
        .with_context(|| format!("Failed to add {} to the {} store", username, store))?;

    Ok(credential)
}

/// Create the configured administrator if the admin store is empty
///
/// Returns `true` when an administrator was created.
pub async fn seed_admin(db: &Database, bootstrap: &BootstrapConfig) -> Result<bool> {
    let username = bootstrap.admin_username.as_deref().filter(|u| !u.is_empty());
    let password = bootstrap.admin_password.as_ref().filter(|p| !p.is_empty());

    let (Some(username), Some(password)) = (username, password) else {
        if !db.has_credentials(CredentialStore::Admins).await? {
            warn!("Admin store is empty and no bootstrap administrator is configured");
        }
        return Ok(false);
    };

    if db.has_credentials(CredentialStore::Admins).await? {
        return Ok(false);
    }

    add_principal(db, CredentialStore::Admins, username, password.expose()).await?;
    info!("Bootstrap administrator created (username: {})", username);
    Ok(true)
}
