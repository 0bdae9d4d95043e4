use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::supervisor::{ShutdownReason, ShutdownTrigger};
use super::tracker::LivenessTracker;
use super::LifecycleSettings;

/// Periodic heartbeat staleness check with a confirmation window.
pub struct HeartbeatMonitor {
    tracker: Arc<LivenessTracker>,
    trigger: ShutdownTrigger,
    token: CancellationToken,
    check_interval: Duration,
    stale_after: Duration,
    confirm_for: Duration,
    dead_after: Duration,
}

impl HeartbeatMonitor {
    pub fn new(tracker: Arc<LivenessTracker>, trigger: ShutdownTrigger, settings: &LifecycleSettings) -> Self {
        Self {
            token: trigger.token(),
            tracker,
            trigger,
            check_interval: settings.heartbeat_check_interval,
            stale_after: settings.heartbeat_stale_after,
            confirm_for: settings.heartbeat_confirm_for,
            dead_after: settings.heartbeat_dead_after,
        }
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until the browser is judged gone or the token is cancelled.
    pub async fn run(self) {
        self.tracker.record_heartbeat();
        let mut ticker = time::interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = self.token.cancelled() => {
                    debug!("Heartbeat monitor stopped");
                    return;
                }
                _ = ticker.tick() => {}
            }

            let elapsed = self.tracker.time_since_last_heartbeat();
            if elapsed <= self.stale_after {
                continue;
            }
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                "No heartbeat received, browser may have been closed"
            );

            tokio::select! {
                _ = self.token.cancelled() => {
                    debug!("Heartbeat monitor stopped during confirmation");
                    return;
                }
                _ = time::sleep(self.confirm_for) => {}
            }

            let elapsed = self.tracker.time_since_last_heartbeat();
            if elapsed > self.dead_after {
                info!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Browser appears to be closed, shutting down server"
                );
                self.trigger.request(ShutdownReason::HeartbeatLost);
                return;
            }
            info!("Heartbeat resumed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::supervisor::Supervisor;
    use tokio::time::sleep;

    fn start() -> (Arc<LivenessTracker>, Supervisor, tokio::task::JoinHandle<()>) {
        let (supervisor, trigger) = Supervisor::new();
        supervisor.mark_serving();
        let tracker = Arc::new(LivenessTracker::new());
        let monitor = HeartbeatMonitor::new(tracker.clone(), trigger, &LifecycleSettings::default());
        let handle = monitor.spawn();
        (tracker, supervisor, handle)
    }

    async fn requested(supervisor: &mut Supervisor) -> Option<ShutdownReason> {
        tokio::time::timeout(Duration::from_millis(1), supervisor.wait_for_shutdown())
            .await
            .ok()
    }

    #[tokio::test(start_paused = true)]
    async fn steady_heartbeats_keep_server_alive() {
        let (tracker, mut supervisor, handle) = start();
        for _ in 0..300 {
            sleep(Duration::from_secs(2)).await;
            tracker.record_heartbeat();
        }
        assert!(!handle.is_finished());
        assert_eq!(requested(&mut supervisor).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn short_gap_is_confirmed_alive() {
        let (tracker, mut supervisor, handle) = start();
        sleep(Duration::from_millis(700)).await;
        tracker.record_heartbeat();

        // Silent for 5.5s: the 6s tick sees a stale clock and waits to confirm.
        sleep(Duration::from_millis(5_500)).await;
        tracker.record_heartbeat();

        for _ in 0..5 {
            sleep(Duration::from_secs(1)).await;
            tracker.record_heartbeat();
        }
        assert!(!handle.is_finished());
        assert_eq!(requested(&mut supervisor).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn long_silence_requests_shutdown_once() {
        let (tracker, mut supervisor, handle) = start();
        sleep(Duration::from_millis(500)).await;
        tracker.record_heartbeat();

        sleep(Duration::from_secs(7)).await;
        assert!(handle.is_finished());

        // The monitor is gone, so nothing else can be queued behind the first request.
        sleep(Duration::from_secs(20)).await;
        assert_eq!(requested(&mut supervisor).await, Some(ShutdownReason::HeartbeatLost));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_monitor_without_action() {
        let (_tracker, supervisor, handle) = start();
        // Stale at the 6s tick, cancelled halfway through the confirmation wait
        sleep(Duration::from_millis(6_500)).await;
        supervisor.token().cancel();

        let _ = handle.await;
        assert_eq!(supervisor.state(), crate::lifecycle::supervisor::LifecycleState::Serving);
    }
}
