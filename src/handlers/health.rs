//! Health check handler

use axum::{extract::State, Json};

use crate::health::HealthReport;
use crate::AppState;

/// Always 200; `status` tells healthy from degraded
pub async fn check(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.health.report())
}
