use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::supervisor::{ShutdownReason, ShutdownTrigger};
use super::tracker::LivenessTracker;

#[derive(Debug)]
struct PendingShutdown {
    generation: u64,
    timer: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    pending: Option<PendingShutdown>,
}

impl Slot {
    fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.timer.abort();
                true
            }
            None => false,
        }
    }
}

/// Debounced "no connections left" timer. At most one timer is pending;
/// arming a new one replaces the previous.
#[derive(Debug)]
pub struct ShutdownScheduler {
    tracker: Arc<LivenessTracker>,
    grace: Duration,
    trigger: ShutdownTrigger,
    slot: Mutex<Slot>,
}

impl ShutdownScheduler {
    pub fn new(tracker: Arc<LivenessTracker>, grace: Duration, trigger: ShutdownTrigger) -> Arc<Self> {
        Arc::new(Self {
            tracker,
            grace,
            trigger,
            slot: Mutex::new(Slot::default()),
        })
    }

    /// Re-evaluate after a connection-set mutation: arm when empty, cancel otherwise.
    pub fn on_connection_count_changed(self: &Arc<Self>) {
        let mut slot = self.lock_slot();
        let count = self.tracker.connection_count();

        if count > 0 {
            if slot.cancel() {
                debug!(count, "Connection reopened, pending shutdown cancelled");
            }
            return;
        }

        slot.cancel();
        if self.trigger.is_shutting_down() {
            return;
        }
        // Connection guards can be dropped while the runtime itself is going away.
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime available, shutdown timer not armed");
            return;
        };

        slot.generation += 1;
        let generation = slot.generation;
        let scheduler = Arc::clone(self);
        let timer = runtime.spawn(async move {
            tokio::time::sleep(scheduler.grace).await;
            scheduler.fire(generation);
        });
        slot.pending = Some(PendingShutdown { generation, timer });
        debug!(grace_ms = self.grace.as_millis() as u64, "No active connections, shutdown scheduled");
    }

    /// Drop any pending timer.
    pub fn cancel(&self) {
        if self.lock_slot().cancel() {
            debug!("Pending shutdown timer cancelled");
        }
    }

    pub fn has_pending(&self) -> bool {
        self.lock_slot().pending.is_some()
    }

    fn fire(&self, generation: u64) {
        let mut slot = self.lock_slot();
        let current = slot.pending.as_ref().map(|p| p.generation);
        if current != Some(generation) {
            // Superseded between wake-up and lock
            return;
        }
        slot.pending = None;

        let count = self.tracker.connection_count();
        if count > 0 {
            debug!(count, "Shutdown timer fired with live connections, ignoring");
            return;
        }
        info!("No active connections detected, shutting down server");
        self.trigger.request(ShutdownReason::NoConnections);
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
