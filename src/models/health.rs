use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API response for health check
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    /// Open transport connections
    pub connections: usize,
    pub seconds_since_heartbeat: u64,
    /// An empty-connection shutdown timer is armed
    pub shutdown_pending: bool,
}
