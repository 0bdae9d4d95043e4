use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Opaque identifier of one transport-level connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Connection set and last-heartbeat clock shared by the HTTP layer,
/// the shutdown scheduler and the heartbeat monitor.
#[derive(Debug)]
pub struct LivenessTracker {
    connections: Mutex<HashSet<ConnectionId>>,
    next_id: AtomicU64,
    started_at: Instant,
    /// Milliseconds since `started_at` of the latest heartbeat.
    last_heartbeat_ms: AtomicU64,
}

impl LivenessTracker {
    /// The heartbeat clock starts at construction so a fresh server never reads as stale.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashSet::new()),
            next_id: AtomicU64::new(1),
            started_at: Instant::now(),
            last_heartbeat_ms: AtomicU64::new(0),
        }
    }

    pub fn allocate_id(&self) -> ConnectionId {
        ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn on_connection_opened(&self, id: ConnectionId) {
        let count = {
            let mut connections = self.lock_connections();
            connections.insert(id);
            connections.len()
        };
        debug!(connection = %id, count, "Connection opened");
    }

    pub fn on_connection_closed(&self, id: ConnectionId) {
        let (removed, count) = {
            let mut connections = self.lock_connections();
            let removed = connections.remove(&id);
            (removed, connections.len())
        };
        if removed {
            debug!(connection = %id, count, "Connection closed");
        }
    }

    pub fn connection_count(&self) -> usize {
        self.lock_connections().len()
    }

    pub fn record_heartbeat(&self) {
        self.last_heartbeat_ms
            .store(self.elapsed_ms(), Ordering::Release);
    }

    pub fn time_since_last_heartbeat(&self) -> Duration {
        let last = self.last_heartbeat_ms.load(Ordering::Acquire);
        Duration::from_millis(self.elapsed_ms().saturating_sub(last))
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    // A poisoned set is still a valid set; bookkeeping must never fail.
    fn lock_connections(&self) -> std::sync::MutexGuard<'_, HashSet<ConnectionId>> {
        self.connections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for LivenessTracker {
    fn default() -> Self {
        Self::new()
    }
}
