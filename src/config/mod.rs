//! Configuration: command line, config file and environment

mod args;
mod settings;

pub use args::{Args, Command, RunOverrides};
pub use settings::{ConfigError, KeepAliveConfig, DEFAULT_INTERVAL_SECS, DEFAULT_LOCK_NAME};
