use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Why the server is going down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Ctrl-C or SIGTERM.
    Signal,
    /// The page stopped sending heartbeats.
    HeartbeatLost,
    /// The connection set stayed empty for the whole grace window.
    NoConnections,
}

impl ShutdownReason {
    /// Abrupt shutdowns skip the connection drain: nobody is left to observe it.
    pub fn is_abrupt(self) -> bool {
        matches!(self, ShutdownReason::NoConnections)
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ShutdownReason::Signal => "termination signal",
            ShutdownReason::HeartbeatLost => "browser heartbeat lost",
            ShutdownReason::NoConnections => "no active connections",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Serving,
    ShuttingDown,
    Stopped,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<LifecycleState>,
    token: CancellationToken,
}

impl Shared {
    fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn transition(&self, from: &[LifecycleState], to: LifecycleState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if from.contains(&*state) {
            debug!(from = ?*state, to = ?to, "Lifecycle transition");
            *state = to;
            true
        } else {
            false
        }
    }
}

/// Producer side of the shutdown channel. Cheap to clone; handed to the
/// heartbeat monitor, the shutdown scheduler and the signal listener.
#[derive(Clone, Debug)]
pub struct ShutdownTrigger {
    shared: Arc<Shared>,
    intents: mpsc::UnboundedSender<ShutdownReason>,
}

impl ShutdownTrigger {
    /// Ask the supervisor to shut down. Returns `false` when a shutdown is
    /// already underway and this request was ignored.
    ///
    /// A request sent after the supervisor took the first one but before it
    /// closed the channel still returns `true`; it is queued and never acted on.
    pub fn request(&self, reason: ShutdownReason) -> bool {
        if self.shared.token.is_cancelled() {
            debug!(%reason, "Shutdown already in progress, request ignored");
            return false;
        }
        match self.intents.send(reason) {
            Ok(()) => true,
            Err(_) => {
                debug!(%reason, "Supervisor no longer listening, request ignored");
                false
            }
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.shared.token.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shared.token.is_cancelled()
    }
}

/// Single consumer of shutdown requests; owns the lifecycle state machine.
#[derive(Debug)]
pub struct Supervisor {
    shared: Arc<Shared>,
    intents: mpsc::UnboundedReceiver<ShutdownReason>,
    // Keeps the channel open so `wait_for_shutdown` only returns on a real request.
    _keepalive: mpsc::UnboundedSender<ShutdownReason>,
}

impl Supervisor {
    pub fn new() -> (Self, ShutdownTrigger) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            state: Mutex::new(LifecycleState::Starting),
            token: CancellationToken::new(),
        });
        let trigger = ShutdownTrigger {
            shared: shared.clone(),
            intents: tx.clone(),
        };
        let supervisor = Self {
            shared,
            intents: rx,
            _keepalive: tx,
        };
        (supervisor, trigger)
    }

    pub fn state(&self) -> LifecycleState {
        self.shared.state()
    }

    pub fn token(&self) -> CancellationToken {
        self.shared.token.clone()
    }

    pub fn mark_serving(&self) {
        self.shared
            .transition(&[LifecycleState::Starting], LifecycleState::Serving);
    }

    /// Wait for the first shutdown request. Everything sent afterwards is dropped.
    pub async fn wait_for_shutdown(&mut self) -> ShutdownReason {
        let reason = self
            .intents
            .recv()
            .await
            .unwrap_or(ShutdownReason::Signal);
        self.intents.close();

        if self.shared.transition(
            &[LifecycleState::Starting, LifecycleState::Serving],
            LifecycleState::ShuttingDown,
        ) {
            info!(%reason, "Shutting down");
        } else {
            warn!(%reason, state = ?self.state(), "Shutdown requested outside of serving state");
        }
        self.shared.token.cancel();
        reason
    }

    pub fn mark_stopped(&self) {
        self.shared.transition(
            &[LifecycleState::ShuttingDown],
            LifecycleState::Stopped,
        );
    }
}

/// Forward Ctrl-C and SIGTERM into the shutdown channel until shutdown starts.
pub fn spawn_signal_listener(trigger: ShutdownTrigger) {
    let token = trigger.token();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = termination_signal() => {
                info!("Received shutdown signal");
                trigger.request(ShutdownReason::Signal);
            }
        }
    });
}

async fn termination_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
