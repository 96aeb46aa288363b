use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppMonitor;

#[derive(Clone)]
pub struct HealthState {
    pub monitor: Arc<AppMonitor>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Whether the service is running
    pub healthy: bool,
    /// Feed identifiers being polled
    pub feeds: Vec<String>,
    /// Background refresh interval in seconds
    pub poll_interval_secs: u64,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service health status", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        feeds: state.monitor.feed_ids().to_vec(),
        poll_interval_secs: state.monitor.poll_interval().as_secs(),
    })
}

pub fn router(monitor: Arc<AppMonitor>) -> Router {
    let state = HealthState { monitor };
    Router::new().route("/", get(health_check)).with_state(state)
}
