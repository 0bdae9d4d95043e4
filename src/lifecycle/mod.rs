//! Self-terminating server lifecycle.
//!
//! The browser tab is the only client. The server goes away when either
//! the transport connection set stays empty for a grace window, or the page
//! stops sending heartbeats, or the process receives a termination signal.

pub mod connection;
pub mod monitor;
pub mod scheduler;
pub mod supervisor;
pub mod tracker;

pub use connection::TrackConnections;
pub use monitor::HeartbeatMonitor;
pub use scheduler::ShutdownScheduler;
pub use supervisor::{spawn_signal_listener, ShutdownReason, ShutdownTrigger, Supervisor};
pub use tracker::{ConnectionId, LivenessTracker};

use std::sync::Arc;
use std::time::Duration;

/// Timings for liveness detection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LifecycleSettings {
    /// Delay between the last connection closing and shutdown.
    pub shutdown_grace: Duration,
    pub heartbeat_check_interval: Duration,
    /// Elapsed time that opens the confirmation window.
    pub heartbeat_stale_after: Duration,
    pub heartbeat_confirm_for: Duration,
    /// Elapsed time, re-read after confirmation, that shuts the server down.
    pub heartbeat_dead_after: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            shutdown_grace: Duration::from_secs(5),
            heartbeat_check_interval: Duration::from_secs(1),
            heartbeat_stale_after: Duration::from_secs(5),
            heartbeat_confirm_for: Duration::from_secs(1),
            heartbeat_dead_after: Duration::from_secs(6),
        }
    }
}

/// Per-server liveness state handed to the HTTP layer.
#[derive(Clone, Debug)]
pub struct Lifecycle {
    tracker: Arc<LivenessTracker>,
    scheduler: Arc<ShutdownScheduler>,
    trigger: ShutdownTrigger,
    settings: LifecycleSettings,
}

impl Lifecycle {
    pub fn new(settings: LifecycleSettings, trigger: ShutdownTrigger) -> Self {
        let tracker = Arc::new(LivenessTracker::new());
        let scheduler = ShutdownScheduler::new(tracker.clone(), settings.shutdown_grace, trigger.clone());
        Self {
            tracker,
            scheduler,
            trigger,
            settings,
        }
    }

    pub fn tracker(&self) -> &LivenessTracker {
        &self.tracker
    }

    pub fn scheduler(&self) -> &ShutdownScheduler {
        &self.scheduler
    }

    pub fn connection_opened(&self, id: ConnectionId) {
        self.tracker.on_connection_opened(id);
        self.scheduler.on_connection_count_changed();
    }

    pub fn connection_closed(&self, id: ConnectionId) {
        self.tracker.on_connection_closed(id);
        self.scheduler.on_connection_count_changed();
    }

    pub fn record_heartbeat(&self) {
        self.tracker.record_heartbeat();
    }

    pub fn spawn_heartbeat_monitor(&self) -> tokio::task::JoinHandle<()> {
        HeartbeatMonitor::new(self.tracker.clone(), self.trigger.clone(), &self.settings).spawn()
    }

    /// Stop background timers. Monitor and signal listener follow the token.
    pub fn shutdown(&self) {
        self.scheduler.cancel();
    }
}
