//! Liveness handler.

use std::sync::Arc;

use axum::{Json, extract::State};
use rudder_telemetry::build_sha;
use serde::Serialize;

use crate::state::ApiState;

/// Liveness payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok` when the process is serving.
    pub status: &'static str,
    /// Build identifier recorded at logging initialisation.
    pub build_sha: &'static str,
    /// Seconds since startup.
    pub uptime_seconds: u64,
}

/// `GET /health`.
pub async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        build_sha: build_sha(),
        uptime_seconds: state.uptime_seconds(),
    })
}
