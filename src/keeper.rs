//! Keep-awake main loop
//!
//! Start-up order is fixed: log start, assert the awake state, take the
//! instance lock, log that keep-awake is enabled. After that the loop waits
//! one interval at a time, logging a heartbeat and re-asserting after each
//! wait, until a stop signal arrives on the channel (or every sender is gone).

use crate::activity::ActivityLog;
use crate::config::KeepAliveConfig;
use crate::error::Result;
use crate::instance::{Acquisition, InstanceGuard};
use crate::power::{SystemWake, WakeAssertion};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, info};

pub const MSG_START: &str = "Starting keep-awake";
pub const MSG_ALREADY_RUNNING: &str = "Keep-awake is already running";
pub const MSG_ENABLED: &str = "Keep-awake enabled";
pub const MSG_HEARTBEAT: &str = "System kept awake";
pub const MSG_STOPPED: &str = "Keep-awake stopped";

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another instance holds the lock; nothing was started
    AlreadyRunning,
    /// The loop was stopped after this many heartbeats
    Stopped { heartbeats: u64 },
}

/// Route console stop events into a channel for [`KeepAlive::run`]
///
/// Covers Ctrl+C and Ctrl+Break, plus console close, logoff and shutdown on
/// Windows (SIGTERM/SIGHUP on Unix). Only one handler per process.
pub fn install_stop_handler() -> Result<Receiver<()>> {
    let (stop_tx, stop_rx) = bounded(1);
    ctrlc::set_handler(move || {
        info!("Received stop signal, stopping...");
        let _ = stop_tx.try_send(());
    })?;
    Ok(stop_rx)
}

/// Keep-awake controller
pub struct KeepAlive<W: WakeAssertion = SystemWake> {
    log: ActivityLog,
    wake: W,
    lock_name: String,
    interval: Duration,
}

impl KeepAlive<SystemWake> {
    /// Build a controller using the OS power API
    pub fn from_config(config: &KeepAliveConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            ActivityLog::new(&config.log_path),
            SystemWake::new(config.keep_display),
            &config.lock_name,
            config.interval(),
        ))
    }
}

impl<W: WakeAssertion> KeepAlive<W> {
    pub fn new(log: ActivityLog, wake: W, lock_name: &str, interval: Duration) -> Self {
        Self {
            log,
            wake,
            lock_name: lock_name.to_string(),
            interval,
        }
    }

    /// Activity log used by this controller
    pub fn activity_log(&self) -> &ActivityLog {
        &self.log
    }

    /// Run until `stop` fires or disconnects
    ///
    /// Returns [`RunOutcome::AlreadyRunning`] right after start-up when
    /// another instance holds the lock. Errors only if the lock cannot be
    /// created at all.
    pub fn run(&self, stop: &Receiver<()>) -> Result<RunOutcome> {
        self.log.log(MSG_START);
        self.wake.assert_awake();

        let guard = match InstanceGuard::acquire(&self.lock_name)? {
            Acquisition::Acquired(guard) => guard,
            Acquisition::AlreadyRunning => {
                self.log.log(MSG_ALREADY_RUNNING);
                return Ok(RunOutcome::AlreadyRunning);
            }
        };

        self.log.log(MSG_ENABLED);
        debug!("Heartbeat every {:?}", self.interval);

        let mut heartbeats = 0u64;
        loop {
            match stop.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => {
                    self.log.log(MSG_HEARTBEAT);
                    self.wake.assert_awake();
                    heartbeats += 1;
                }
                Ok(()) => {
                    info!("Stop requested");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("Stop channel closed");
                    break;
                }
            }
        }

        self.log.log(MSG_STOPPED);
        self.wake.release();
        drop(guard);

        Ok(RunOutcome::Stopped { heartbeats })
    }
}
