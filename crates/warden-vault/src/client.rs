//! Vault KV v2 client

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::VaultError;

/// Vault client configuration
#[derive(Clone)]
pub struct VaultClientConfig {
    /// Base address, e.g. `http://vault:8200`
    pub address: String,
    /// Token sent as `X-Vault-Token`
    pub token: String,
    /// KV v2 mount point
    pub mount: String,
    /// Secret path below the mount
    pub path: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Total attempts before giving up
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub retry_delay: Duration,
}

impl std::fmt::Debug for VaultClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClientConfig")
            .field("address", &self.address)
            .field("token", &"<redacted>")
            .field("mount", &self.mount)
            .field("path", &self.path)
            .field("request_timeout", &self.request_timeout)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

/// KV v2 read response: `{"data": {"data": {...}, "metadata": {...}}}`
#[derive(Debug, Deserialize)]
struct KvReadResponse {
    data: KvData,
}

#[derive(Debug, Deserialize)]
struct KvData {
    data: HashMap<String, serde_json::Value>,
}

/// Vault API client
pub struct VaultClient {
    config: VaultClientConfig,
    client: Client,
    secret_url: Url,
}

impl VaultClient {
    /// Create a new Vault client
    pub fn new(config: VaultClientConfig) -> Result<Self, VaultError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        let secret_url = secret_url(&config)?;

        info!("Created Vault client for {}", secret_url);

        Ok(Self {
            config,
            client,
            secret_url,
        })
    }

    /// Read the secret once
    pub async fn read_secrets(&self) -> Result<HashMap<String, String>, VaultError> {
        debug!("Reading secrets from {}", self.secret_url);

        let response = self
            .client
            .get(self.secret_url.clone())
            .header("X-Vault-Token", &self.config.token)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                return Err(VaultError::NotFound(self.config.path.clone()));
            }
            StatusCode::FORBIDDEN => {
                return Err(VaultError::PermissionDenied(self.config.path.clone()));
            }
            status => {
                let message = response.text().await.unwrap_or_default();
                return Err(VaultError::VaultStatus {
                    status: status.as_u16(),
                    message,
                });
            }
        }

        let body: KvReadResponse = response
            .json()
            .await
            .map_err(|e| VaultError::InvalidResponse(e.to_string()))?;

        Ok(body
            .data
            .data
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect())
    }

    /// Read the secret, retrying with a fixed delay
    pub async fn read_secrets_with_retry(&self) -> Result<HashMap<String, String>, VaultError> {
        retry_with_delay(self.config.max_attempts, self.config.retry_delay, |_| {
            self.read_secrets()
        })
        .await
    }
}

/// Build `{address}/v1/{mount}/data/{path}`
fn secret_url(config: &VaultClientConfig) -> Result<Url, VaultError> {
    let base = Url::parse(&config.address)
        .map_err(|e| VaultError::InvalidAddress(format!("{}: {}", config.address, e)))?;

    let mount = config.mount.trim_matches('/');
    let path = config.path.trim_matches('/');
    if mount.is_empty() || path.is_empty() {
        return Err(VaultError::InvalidAddress(
            "mount and path must not be empty".to_string(),
        ));
    }

    base.join(&format!("v1/{}/data/{}", mount, path))
        .map_err(|e| VaultError::InvalidAddress(e.to_string()))
}

/// Run `op` up to `max_attempts` times, sleeping `delay` between failures
///
/// `op` receives the 1-based attempt number. After the last failure the
/// final error is wrapped in [`VaultError::Exhausted`].
pub async fn retry_with_delay<T, F, Fut>(
    max_attempts: u32,
    delay: Duration,
    mut op: F,
) -> Result<T, VaultError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, VaultError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!("Vault read succeeded on attempt {}", attempt);
                }
                return Ok(value);
            }
            Err(e) if attempt >= max_attempts => {
                return Err(VaultError::Exhausted {
                    attempts: attempt,
                    last: Box::new(e),
                });
            }
            Err(e) => {
                warn!(
                    "Vault attempt {}/{} failed: {}; retrying in {:?}",
                    attempt, max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
