//! Application state

use std::sync::Arc;
use warden_auth::{CredentialVerifier, JwtManager};

/// Prometheus recorder handle used by the `/metrics` route
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
///
/// Everything here is built once at startup and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<CredentialVerifier>,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(verifier: Arc<CredentialVerifier>, jwt: Arc<JwtManager>) -> Self {
        Self { verifier, jwt }
    }
}
