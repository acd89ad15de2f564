//! Health check endpoint.

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use chrono::Utc;
use dockhook_preflight::CapabilityReport;
use serde::Serialize;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub checks: CapabilityReport,
    pub timestamp: String,
}

/// Re-probe system tooling on every request; 503 if anything is missing.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let checks = state.system.check().await;
    let (code, status) = if checks.healthy() {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        code,
        Json(HealthResponse {
            status,
            checks,
            timestamp: Utc::now().to_rfc3339(),
        }),
    )
}
