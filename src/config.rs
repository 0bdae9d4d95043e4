use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

use crate::lifecycle::LifecycleSettings;

/// Environment variables are read with this prefix, e.g. `JSON2YAML_PORT`.
const ENV_PREFIX: &str = "JSON2YAML_";

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Address the web server binds to
    #[serde(default = "default_host")]
    pub host: String,

    /// Web server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Launch the default browser once the server is up
    #[serde(default = "default_open_browser")]
    pub open_browser: bool,

    #[serde(default = "default_browser_delay_ms")]
    pub browser_delay_ms: u64,

    /// Time without any connection before the server exits
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,

    #[serde(default = "default_heartbeat_check_interval_ms")]
    pub heartbeat_check_interval_ms: u64,

    #[serde(default = "default_heartbeat_stale_ms")]
    pub heartbeat_stale_ms: u64,

    #[serde(default = "default_heartbeat_confirm_ms")]
    pub heartbeat_confirm_ms: u64,

    #[serde(default = "default_heartbeat_dead_ms")]
    pub heartbeat_dead_ms: u64,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        Self::from_env()
    }

    fn from_env() -> Result<Self, ConfigError> {
        let config = envy::prefixed(ENV_PREFIX)
            .from_env::<Config>()
            .map_err(ConfigError::Env)?;
        Self::validated(config)
    }

    fn validated(config: Config) -> Result<Self, ConfigError> {
        match config.validate() {
            Ok(()) => {
                info!("Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("Invalid configuration: {}", e);
                Err(e)
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat_check_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "heartbeat_check_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.heartbeat_confirm_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "heartbeat_confirm_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.heartbeat_dead_ms < self.heartbeat_stale_ms {
            return Err(ConfigError::InvalidValue {
                field: "heartbeat_dead_ms",
                reason: format!(
                    "{} is below heartbeat_stale_ms ({})",
                    self.heartbeat_dead_ms, self.heartbeat_stale_ms
                ),
            });
        }
        // A stale heartbeat must be able to cross the dead threshold within one confirmation
        if self.heartbeat_stale_ms.saturating_add(self.heartbeat_confirm_ms) < self.heartbeat_dead_ms {
            return Err(ConfigError::InvalidValue {
                field: "heartbeat_dead_ms",
                reason: format!(
                    "{} exceeds heartbeat_stale_ms + heartbeat_confirm_ms ({})",
                    self.heartbeat_dead_ms,
                    self.heartbeat_stale_ms.saturating_add(self.heartbeat_confirm_ms)
                ),
            });
        }
        Ok(())
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn browser_delay(&self) -> Duration {
        Duration::from_millis(self.browser_delay_ms)
    }

    pub fn lifecycle_settings(&self) -> LifecycleSettings {
        LifecycleSettings {
            shutdown_grace: Duration::from_millis(self.shutdown_grace_ms),
            heartbeat_check_interval: Duration::from_millis(self.heartbeat_check_interval_ms),
            heartbeat_stale_after: Duration::from_millis(self.heartbeat_stale_ms),
            heartbeat_confirm_for: Duration::from_millis(self.heartbeat_confirm_ms),
            heartbeat_dead_after: Duration::from_millis(self.heartbeat_dead_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            open_browser: default_open_browser(),
            browser_delay_ms: default_browser_delay_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            heartbeat_check_interval_ms: default_heartbeat_check_interval_ms(),
            heartbeat_stale_ms: default_heartbeat_stale_ms(),
            heartbeat_confirm_ms: default_heartbeat_confirm_ms(),
            heartbeat_dead_ms: default_heartbeat_dead_ms(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    Env(#[source] envy::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_open_browser() -> bool {
    true
}

fn default_browser_delay_ms() -> u64 {
    500
}

fn default_shutdown_grace_ms() -> u64 {
    5_000
}

fn default_heartbeat_check_interval_ms() -> u64 {
    1_000
}

fn default_heartbeat_stale_ms() -> u64 {
    5_000
}

fn default_heartbeat_confirm_ms() -> u64 {
    1_000
}

fn default_heartbeat_dead_ms() -> u64 {
    6_000
}
