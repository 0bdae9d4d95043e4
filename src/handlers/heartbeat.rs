use crate::routes::AppState;
use axum::{
    extract::State,
    http::{header::CACHE_CONTROL, StatusCode},
    response::IntoResponse,
};
use tracing::trace;

/// Heartbeat from the open page
pub async fn heartbeat(State(app): State<AppState>) -> impl IntoResponse {
    trace!("Heartbeat received");
    app.lifecycle.record_heartbeat();
    (StatusCode::OK, [(CACHE_CONTROL, "no-store")], "ok")
}
