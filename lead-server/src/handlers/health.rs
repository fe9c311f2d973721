//! Health check handler

use std::sync::Arc;

use axum::{extract::State, Json};
use leadscore_core::ScoringService;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    model_ready: bool,
    timestamp: i64,
}

/// Always 200; a missing model only degrades the status
pub async fn check(State(scoring): State<Arc<ScoringService>>) -> Json<HealthResponse> {
    let model_ready = scoring.is_ready();

    Json(HealthResponse {
        status: if model_ready { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        model_ready,
        timestamp: chrono::Utc::now().timestamp(),
    })
}
