//! Configuration loading and management
//!
//! Values come from an optional TOML file overlaid with `WARDEN__`-prefixed
//! environment variables (`WARDEN__JWT__SECRET` sets `jwt.secret`). When
//! Vault is enabled, secrets read from it are applied last.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use warden_auth::{AuthError, SigningConfig};
use warden_vault::VaultClientConfig;

/// Environment variable prefix and nesting separator
const ENV_PREFIX: &str = "WARDEN";
const ENV_SEPARATOR: &str = "__";

/// Longest accepted token lifetime (one year)
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// A configuration value that must never be printed
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Credential database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Upper bound on a single credential lookup
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

/// Token signing configuration
///
/// There are deliberately no defaults for the secret, issuer or audience.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    #[serde(default)]
    pub secret: Option<Secret>,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: None,
            issuer: None,
            audience: None,
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

/// Vault (KV v2) secret source
#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_vault_address")]
    pub address: String,
    #[serde(default)]
    pub token: Secret,
    #[serde(default = "default_vault_mount")]
    pub mount: String,
    #[serde(default = "default_vault_path")]
    pub path: String,
    #[serde(default = "default_vault_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_vault_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_vault_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: default_vault_address(),
            token: Secret::default(),
            mount: default_vault_mount(),
            path: default_vault_path(),
            max_attempts: default_vault_max_attempts(),
            retry_delay_secs: default_vault_retry_delay_secs(),
            request_timeout_secs: default_vault_request_timeout_secs(),
        }
    }
}

impl VaultConfig {
    pub fn client_config(&self) -> VaultClientConfig {
        VaultClientConfig {
            address: self.address.clone(),
            token: self.token.expose().to_string(),
            mount: self.mount.clone(),
            path: self.path.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_attempts: self.max_attempts,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; empty disables CORS, `*` allows any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Prometheus metrics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

/// Initial administrator, created only while the admin store is empty
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub admin_username: Option<String>,
    #[serde(default)]
    pub admin_password: Option<Secret>,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "./data/warden.db".to_string()
}

fn default_lookup_timeout_ms() -> u64 {
    5000
}

fn default_token_ttl_hours() -> i64 {
    warden_auth::jwt::DEFAULT_TOKEN_TTL_HOURS
}

fn default_vault_address() -> String {
    "http://127.0.0.1:8200".to_string()
}

fn default_vault_mount() -> String {
    "secret".to_string()
}

fn default_vault_path() -> String {
    "warden".to_string()
}

fn default_vault_max_attempts() -> u32 {
    5
}

fn default_vault_retry_delay_secs() -> u64 {
    3
}

fn default_vault_request_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Config {
    /// Load configuration from a file and the process environment
    pub fn load(path: &str) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Load configuration, reading environment overrides from `env` when given
    pub fn load_with_env(path: &str, env: Option<config::Map<String, String>>) -> Result<Self> {
        let config_path = Path::new(path);

        let settings = config::Config::builder()
            .add_source(
                config::File::from(config_path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        let config: Config = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse configuration from {}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that can never work
    pub fn validate(&self) -> Result<()> {
        if self.jwt.token_ttl_hours <= 0 || self.jwt.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            bail!(
                "jwt.token_ttl_hours must be between 1 and {}",
                MAX_TOKEN_TTL_HOURS
            );
        }
        if self.database.lookup_timeout_ms == 0 {
            bail!("database.lookup_timeout_ms must be positive");
        }
        if self.vault.enabled {
            if self.vault.token.is_empty() {
                bail!("vault.token is required when vault.enabled = true");
            }
            if self.vault.max_attempts == 0 {
                bail!("vault.max_attempts must be at least 1");
            }
        }
        Ok(())
    }

    /// Overlay secrets read from Vault; returns how many keys were applied
    ///
    /// Recognised keys: `Jwt__Secret`, `Jwt__Issuer`, `Jwt__Audience`,
    /// `Database__Path`. Unknown keys are ignored.
    pub fn apply_vault_secrets(&mut self, secrets: &HashMap<String, String>) -> usize {
        let mut applied = 0;

        for (key, value) in secrets {
            match key.as_str() {
                "Jwt__Secret" => self.jwt.secret = Some(Secret::from(value.clone())),
                "Jwt__Issuer" => self.jwt.issuer = Some(value.clone()),
                "Jwt__Audience" => self.jwt.audience = Some(value.clone()),
                "Database__Path" => self.database.path = value.clone(),
                _ => continue,
            }
            applied += 1;
        }

        applied
    }

    /// Build the immutable signing configuration
    pub fn signing_config(&self) -> Result<SigningConfig, AuthError> {
        let secret = self
            .jwt
            .secret
            .as_ref()
            .map(|s| s.expose().to_string())
            .unwrap_or_default();

        let token_ttl = chrono::TimeDelta::try_hours(self.jwt.token_ttl_hours).ok_or_else(|| {
            AuthError::InvalidTokenLifetime(format!("{} hours", self.jwt.token_ttl_hours))
        })?;

        Ok(SigningConfig::new(
            secret,
            self.jwt.issuer.clone().unwrap_or_default(),
            self.jwt.audience.clone().unwrap_or_default(),
        )?
        .with_token_ttl(token_ttl))
    }

    /// SQLite connection URL, creating the file if needed
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.database.path)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.database.lookup_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn env(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load_with_env("/nonexistent/warden.toml", env(&[])).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.jwt.token_ttl_hours, 24);
        assert_eq!(config.vault.max_attempts, 5);
        assert_eq!(config.vault.retry_delay_secs, 3);
        assert!(!config.vault.enabled);
        assert!(config.jwt.secret.is_none());
    }

    #[test]
    fn test_file_and_env_layering() {
        let file = write_config(
            r#"
            [server]
            port = 9000

            [jwt]
            secret = "file-secret"
            issuer = "warden"
            audience = "warden-clients"

            [logging]
            format = "json"
            "#,
        );

        let config = Config::load_with_env(
            file.path().to_str().unwrap(),
            env(&[
                ("WARDEN__JWT__SECRET", "env-secret"),
                ("WARDEN__SERVER__PORT", "9100"),
                ("WARDEN__CORS__ALLOWED_ORIGINS", "https://a.example,https://b.example"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.jwt.secret.as_ref().unwrap().expose(), "env-secret");
        assert_eq!(config.jwt.issuer.as_deref(), Some("warden"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_validation_rejects_vault_without_token() {
        let file = write_config(
            r#"
            [vault]
            enabled = true
            "#,
        );
        assert!(Config::load_with_env(file.path().to_str().unwrap(), env(&[])).is_err());
    }

    #[test]
    fn test_validation_bounds_token_ttl() {
        for ttl in ["0", "1000000000000"] {
            let file = write_config(&format!("[jwt]\ntoken_ttl_hours = {}\n", ttl));
            assert!(Config::load_with_env(file.path().to_str().unwrap(), env(&[])).is_err());
        }

        let file = write_config("[jwt]\ntoken_ttl_hours = 8760\n");
        let config = Config::load_with_env(file.path().to_str().unwrap(), env(&[])).unwrap();
        assert_eq!(config.jwt.token_ttl_hours, 8760);
    }

    #[test]
    fn test_signing_config_rejects_unrepresentable_ttl() {
        let mut config = Config::default();
        config.jwt.secret = Some(Secret::from("s3cret".to_string()));
        config.jwt.issuer = Some("warden".to_string());
        config.jwt.audience = Some("warden-clients".to_string());
        config.jwt.token_ttl_hours = i64::MAX;

        assert!(matches!(
            config.signing_config(),
            Err(AuthError::InvalidTokenLifetime(_))
        ));
    }

    #[test]
    fn test_signing_config_requires_secret() {
        let mut config = Config::default();
        config.jwt.issuer = Some("warden".to_string());
        config.jwt.audience = Some("warden-clients".to_string());

        assert!(matches!(
            config.signing_config(),
            Err(AuthError::MissingSigningConfiguration(_))
        ));

        config.jwt.secret = Some(Secret::from("s3cret".to_string()));
        let signing = config.signing_config().unwrap();
        assert_eq!(signing.issuer(), "warden");
        assert_eq!(signing.token_ttl(), chrono::Duration::hours(24));
    }

    #[test]
    fn test_apply_vault_secrets() {
        let mut config = Config::default();
        let secrets = HashMap::from([
            ("Jwt__Secret".to_string(), "vault-secret".to_string()),
            ("Jwt__Issuer".to_string(), "vault-issuer".to_string()),
            ("Jwt__Audience".to_string(), "vault-audience".to_string()),
            ("Unrelated".to_string(), "ignored".to_string()),
        ]);

        assert_eq!(config.apply_vault_secrets(&secrets), 3);
        assert_eq!(config.jwt.secret.as_ref().unwrap().expose(), "vault-secret");
        assert_eq!(config.jwt.audience.as_deref(), Some("vault-audience"));
        assert!(config.signing_config().is_ok());
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let mut config = Config::default();
        config.jwt.secret = Some(Secret::from("do-not-print".to_string()));
        assert!(!format!("{:?}", config).contains("do-not-print"));
    }
}
