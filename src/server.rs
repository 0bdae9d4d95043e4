use std::future::IntoFuture;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::browser;
use crate::config::Config;
use crate::lifecycle::{
    spawn_signal_listener, Lifecycle, LifecycleSettings, ShutdownReason, ShutdownTrigger, Supervisor, TrackConnections,
};
use crate::routes::{create_routes, AppState};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Options for one server run.
#[derive(Clone, Debug)]
pub struct ServeOptions {
    pub lifecycle: LifecycleSettings,
    /// Delay before opening the browser; `None` skips it.
    pub open_browser_after: Option<std::time::Duration>,
    /// Listen for Ctrl-C and SIGTERM.
    pub handle_signals: bool,
}

impl ServeOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            lifecycle: config.lifecycle_settings(),
            open_browser_after: config.open_browser.then(|| config.browser_delay()),
            handle_signals: true,
        }
    }
}

/// Bind the configured address and serve until the session ends.
pub async fn run(config: &Config) -> Result<ShutdownReason, ServerError> {
    let address = config.server_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ServerError::Bind { address, source })?;
    serve(listener, ServeOptions::from_config(config)).await
}

/// Serve on an already bound listener until a shutdown request arrives.
pub async fn serve(listener: TcpListener, options: ServeOptions) -> Result<ShutdownReason, ServerError> {
    let (mut supervisor, trigger) = Supervisor::new();
    serve_with(listener, options, &mut supervisor, trigger).await
}

/// Like [`serve`], but shutdown requests go through a caller-owned supervisor.
/// `trigger` must belong to `supervisor`.
pub async fn serve_with(
    listener: TcpListener,
    options: ServeOptions,
    supervisor: &mut Supervisor,
    trigger: ShutdownTrigger,
) -> Result<ShutdownReason, ServerError> {
    let local_addr = listener.local_addr().map_err(ServerError::Serve)?;
    let url = browser_url(local_addr);

    let lifecycle = Lifecycle::new(options.lifecycle.clone(), trigger.clone());
    let token = supervisor.token();

    let app = create_routes(AppState { lifecycle: lifecycle.clone() });
    let server = axum::serve(listener, TrackConnections::new(app, lifecycle.clone()))
        .with_graceful_shutdown(token.clone().cancelled_owned())
        .into_future();
    tokio::pin!(server);

    if options.handle_signals {
        spawn_signal_listener(trigger.clone());
    }
    lifecycle.spawn_heartbeat_monitor();
    if let Some(delay) = options.open_browser_after {
        browser::spawn_open_after(url.clone(), delay, token.clone());
    }

    supervisor.mark_serving();
    info!("Web server listening on {}", url);
    info!("Server will automatically shut down when the browser is closed");

    let reason = tokio::select! {
        result = &mut server => {
            // The accept loop only ends on its own when something broke.
            lifecycle.shutdown();
            token.cancel();
            supervisor.mark_stopped();
            return match result {
                Ok(()) => Err(ServerError::Serve(std::io::Error::other("server stopped unexpectedly"))),
                Err(e) => {
                    error!("Server error: {}", e);
                    Err(ServerError::Serve(e))
                }
            };
        }
        reason = supervisor.wait_for_shutdown() => reason,
    };

    lifecycle.shutdown();
    if reason.is_abrupt() {
        info!("Skipping connection drain");
    } else if let Err(e) = server.await {
        error!("Error while draining connections: {}", e);
    }
    supervisor.mark_stopped();
    info!(%reason, "Server stopped");
    Ok(reason)
}

fn browser_url(addr: SocketAddr) -> String {
    if addr.ip().is_unspecified() || addr.ip().is_loopback() {
        format!("http://localhost:{}", addr.port())
    } else {
        format!("http://{}", addr)
    }
}
