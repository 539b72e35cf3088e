//! Configuration file support

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default name of the system-wide single-instance mutex
pub const DEFAULT_LOCK_NAME: &str = "KeepAliveMutex";

/// Default heartbeat interval (10 minutes)
pub const DEFAULT_INTERVAL_SECS: u64 = 600;

const DEFAULT_LOG_FILE: &str = "keep_alive.log";

const ENV_LOG_PATH: &str = "KEEPALIVE_LOG_PATH";
const ENV_INTERVAL_SECS: &str = "KEEPALIVE_INTERVAL_SECS";
const ENV_LOCK_NAME: &str = "KEEPALIVE_LOCK_NAME";

/// Runtime configuration loaded from TOML file, environment and CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepAliveConfig {
    /// Activity log file (appended to, never truncated)
    pub log_path: PathBuf,

    /// Seconds between heartbeats / wake re-assertions
    pub interval_secs: u64,

    /// Name of the single-instance mutex
    pub lock_name: String,

    /// Also keep the display on (not just the system)
    pub keep_display: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            log_path: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(DEFAULT_LOG_FILE),
            interval_secs: DEFAULT_INTERVAL_SECS,
            lock_name: DEFAULT_LOCK_NAME.to_string(),
            keep_display: true,
            log_level: "info".to_string(),
        }
    }
}

impl KeepAliveConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Load configuration from default locations
    ///
    /// Searches in order:
    /// 1. Same directory as executable: keepalive.toml
    /// 2. User config directory: keepalive\config.toml
    pub fn load_default() -> Result<Self, ConfigError> {
        for candidate in Self::default_locations() {
            if candidate.exists() {
                debug!("Loading configuration from {:?}", candidate);
                return Self::load(&candidate);
            }
        }

        Ok(Self::default())
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut locations = Vec::new();

        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                locations.push(exe_dir.join("keepalive.toml"));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            locations.push(config_dir.join("keepalive").join("config.toml"));
        }

        locations
    }

    /// Apply `KEEPALIVE_*` environment overrides
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_LOG_PATH) {
            self.log_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup(ENV_INTERVAL_SECS) {
            self.interval_secs = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_INTERVAL_SECS,
                message: format!("'{}' is not a whole number of seconds", raw),
            })?;
        }

        if let Some(name) = lookup(ENV_LOCK_NAME) {
            self.lock_name = name;
        }

        Ok(())
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "interval_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.lock_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "lock_name",
                message: "must not be empty".to_string(),
            });
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log_path",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Heartbeat interval
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_string_lossy().to_string(),
                source: e,
            })?;
        }

        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# keepalive configuration

# Activity log file (default: keep_alive.log in the home directory)
# log_path = 'C:\Users\me\keep_alive.log'

# Seconds between heartbeats (default: 600)
interval_secs = 600

# Name of the single-instance mutex (default: KeepAliveMutex)
lock_name = "KeepAliveMutex"

# Keep the display on as well as the system (default: true)
keep_display = true

# Log level: trace, debug, info, warn, error (default: info)
log_level = "info"
"#
        .to_string()
    }
}

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading/writing config file
    #[error("Failed to access config file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Error parsing TOML
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    /// Error serializing config
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    /// A setting has an unusable value
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}
