//! keepalive - keep a Windows machine awake
//!
//! Periodically asserts a "system and display required" execution state,
//! records lifecycle events in an append-only activity log, and guards
//! against running twice with a named system-wide mutex.

pub mod activity;
pub mod config;
pub mod error;
pub mod instance;
pub mod keeper;
pub mod power;

pub use error::{KeepAliveError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
