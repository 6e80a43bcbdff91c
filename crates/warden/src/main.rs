//! Warden - login and token authentication service

use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use clap::{Parser, Subcommand, ValueEnum};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod bootstrap;
mod config;

use config::{Config, CorsConfig, LogFormat, LoggingConfig};
use warden_api::{AppState, create_router};
use warden_auth::{CredentialVerifier, JwtManager, PrincipalProvider, StoreDirectory};
use warden_db::{CredentialStore, Database};
use warden_vault::VaultClient;

/// Warden - issues and checks bearer tokens for administrators and users
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", env = "WARDEN_CONFIG")]
    config: String,

    /// Bind address
    #[arg(long, env = "WARDEN_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "WARDEN_PORT")]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Add a principal to one of the credential stores
    AddPrincipal {
        #[arg(long, value_enum)]
        role: RoleArg,
        #[arg(long)]
        username: String,
        #[arg(long, env = "WARDEN_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    Admin,
    User,
}

impl From<RoleArg> for CredentialStore {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => CredentialStore::Admins,
            RoleArg::User => CredentialStore::Users,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load(&args.config)?;

    init_logging(&config.logging);

    info!("Starting Warden v{}", env!("CARGO_PKG_VERSION"));

    if config.vault.enabled {
        let client = VaultClient::new(config.vault.client_config())?;
        let secrets = client
            .read_secrets_with_retry()
            .await
            .context("Failed to read secrets from Vault")?;
        let applied = config.apply_vault_secrets(&secrets);
        info!("Applied {} secret(s) from Vault", applied);
    }

    let db = open_database(&config).await?;

    match args.command.unwrap_or(Command::Serve) {
        Command::AddPrincipal {
            role,
            username,
            password,
        } => {
            let store = CredentialStore::from(role);
            let credential = bootstrap::add_principal(&db, store, &username, &password).await?;
            info!(
                "Added {} to the {} store (id: {})",
                credential.username, store, credential.id
            );
            Ok(())
        }
        Command::Serve => serve(config, db, args.bind, args.port).await,
    }
}

async fn serve(
    config: Config,
    db: Database,
    bind: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    // Refuse to start without a complete signing configuration
    let signing = config
        .signing_config()
        .context("Token signing is not configured")?;
    let jwt = Arc::new(JwtManager::new(&signing));

    bootstrap::seed_admin(&db, &config.bootstrap).await?;

    // Administrators are consulted before standard users
    let providers: Vec<Arc<dyn PrincipalProvider>> = vec![
        Arc::new(StoreDirectory::admins(db.clone())),
        Arc::new(StoreDirectory::users(db)),
    ];
    let verifier = Arc::new(
        CredentialVerifier::new(providers).with_lookup_timeout(config.lookup_timeout()),
    );

    let metrics_handle = if config.metrics.enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(Arc::new(handle))
    } else {
        None
    };

    let state = AppState::new(verifier, jwt);

    let mut app: Router = create_router(state, metrics_handle);
    if let Some(cors) = cors_layer(&config.cors)? {
        app = app.layer(cors);
    }
    let app = app.layer(TraceLayer::new_for_http());

    let bind_addr = bind.unwrap_or(config.server.bind_address);
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind_addr, port))?;

    info!("Listening on {}", addr);
    info!(
        "Issuer: {}, audience: {}, token lifetime: {}h",
        signing.issuer(),
        signing.audience(),
        signing.token_ttl().num_hours()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Open the credential database, creating its directory if needed
async fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = Path::new(&config.database.path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let db = Database::new(&config.database_url())
        .await
        .with_context(|| format!("Failed to open database at {}", config.database.path))?;
    Ok(db)
}

/// Build the CORS layer; `None` when no origins are configured
fn cors_layer(cors: &CorsConfig) -> Result<Option<CorsLayer>> {
    if cors.allowed_origins.is_empty() {
        return Ok(None);
    }

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if cors.allowed_origins.iter().any(|origin| origin == "*") {
        return Ok(Some(layer.allow_origin(Any)));
    }

    let origins = cors
        .allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).with_context(|| format!("Invalid CORS origin {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(layer.allow_origin(AllowOrigin::list(origins))))
}

/// Initialize logging
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

/// Wait for CTRL+C or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for CTRL+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_disabled_without_origins() {
        assert!(cors_layer(&CorsConfig::default()).unwrap().is_none());
    }

    #[test]
    fn test_cors_origins() {
        let wildcard = CorsConfig {
            allowed_origins: vec!["*".to_string()],
        };
        assert!(cors_layer(&wildcard).unwrap().is_some());

        let listed = CorsConfig {
            allowed_origins: vec!["https://app.example".to_string()],
        };
        assert!(cors_layer(&listed).unwrap().is_some());

        let invalid = CorsConfig {
            allowed_origins: vec!["bad\norigin".to_string()],
        };
        assert!(cors_layer(&invalid).is_err());
    }

    #[test]
    fn test_role_arg_maps_to_store() {
        assert_eq!(CredentialStore::from(RoleArg::Admin), CredentialStore::Admins);
        assert_eq!(CredentialStore::from(RoleArg::User), CredentialStore::Users);
    }

    #[test]
    fn test_cli_parses_add_principal() {
        let args = Args::try_parse_from([
            "warden",
            "add-principal",
            "--role",
            "admin",
            "--username",
            "root",
            "--password",
            "toor",
        ])
        .unwrap();

        match args.command {
            Some(Command::AddPrincipal { role, username, .. }) => {
                assert!(matches!(role, RoleArg::Admin));
                assert_eq!(username, "root");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
