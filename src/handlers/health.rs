use crate::{models::HealthResponse, routes::AppState};
use axum::{extract::State, Json};
use tracing::debug;

/// Health check endpoint
pub async fn health_check(State(app): State<AppState>) -> Json<HealthResponse> {
    debug!("Health check requested");
    let tracker = app.lifecycle.tracker();
    let connections = tracker.connection_count();
    Json(HealthResponse {
        status: "ok".to_string(),
        message: format!("Server is running with {} open connection(s)", connections),
        connections,
        seconds_since_heartbeat: tracker.time_since_last_heartbeat().as_secs(),
        shutdown_pending: app.lifecycle.scheduler().has_pending(),
    })
}
