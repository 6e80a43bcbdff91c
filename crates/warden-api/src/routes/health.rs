//! Liveness endpoints

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub service: &'static str,
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health, /healthz
///
/// Reports process liveness only; credential stores are not probed.
async fn health() -> Json<HealthResponse> {
    metrics::counter!("warden_health_checks_total").increment(1);

    Json(HealthResponse {
        service: "warden",
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
}
