use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Platform command that hands a URL to the default browser.
fn open_command(url: &str) -> Command {
    let mut cmd = if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        // The empty argument is the window title expected by `start`
        cmd.args(["/c", "start", ""]);
        cmd
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else {
        Command::new("xdg-open")
    };
    cmd.arg(url);
    cmd
}

/// Run the launcher to completion so it is reaped instead of left as a zombie.
async fn launch(mut cmd: Command) -> std::io::Result<ExitStatus> {
    cmd.spawn()?.wait().await
}

pub async fn open(url: &str) {
    match launch(open_command(url)).await {
        Ok(status) if status.success() => info!("Opened browser at {}", url),
        Ok(status) => {
            warn!("Browser launcher exited with {}", status);
            eprintln!("Please open your browser and navigate to: {url}");
        }
        Err(e) => {
            warn!("Failed to open browser: {}", e);
            eprintln!("Please open your browser and navigate to: {url}");
        }
    }
}

/// Open `url` after `delay`, unless the server is already going down.
pub fn spawn_open_after(url: String, delay: Duration, token: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(delay) => open(&url).await,
        }
    });
}
