//! Execution-state assertion (keep the system and display awake)

use tracing::debug;

/// Something that can hold the machine awake
///
/// Implementations are best-effort: failures are traced, never returned.
pub trait WakeAssertion {
    /// Assert (or refresh) the awake state
    fn assert_awake(&self);

    /// Clear the awake state so normal power policy applies again
    fn release(&self);
}

/// Thread execution state assertion through the OS power API
#[derive(Debug, Clone, Copy)]
pub struct SystemWake {
    keep_display: bool,
}

impl SystemWake {
    /// Create an assertor; `keep_display` also prevents display timeout
    pub fn new(keep_display: bool) -> Self {
        Self { keep_display }
    }

    /// Whether the display flag is part of the assertion
    pub fn keeps_display(&self) -> bool {
        self.keep_display
    }
}

impl Default for SystemWake {
    fn default() -> Self {
        Self::new(true)
    }
}

impl WakeAssertion for SystemWake {
    fn assert_awake(&self) {
        debug!(display = self.keep_display, "Asserting awake state");
        platform::assert_awake(self.keep_display);
    }

    fn release(&self) {
        debug!("Clearing awake state");
        platform::release();
    }
}

#[cfg(windows)]
mod platform {
    use tracing::{debug, trace};
    use windows::Win32::System::Power::{
        SetThreadExecutionState, ES_CONTINUOUS, ES_DISPLAY_REQUIRED, ES_SYSTEM_REQUIRED,
        EXECUTION_STATE,
    };

    pub fn assert_awake(keep_display: bool) {
        let mut flags = ES_CONTINUOUS | ES_SYSTEM_REQUIRED;
        if keep_display {
            flags = flags | ES_DISPLAY_REQUIRED;
        }
        apply(flags);
    }

    pub fn release() {
        apply(ES_CONTINUOUS);
    }

    fn apply(flags: EXECUTION_STATE) {
        // Returns the previous state, or zero on failure
        let previous = unsafe { SetThreadExecutionState(flags) };
        if previous.0 == 0 {
            debug!("SetThreadExecutionState({:#x}) failed", flags.0);
        } else {
            trace!(
                "Execution state {:#x} -> {:#x}",
                previous.0,
                flags.0
            );
        }
    }
}

#[cfg(not(windows))]
mod platform {
    use tracing::trace;

    pub fn assert_awake(keep_display: bool) {
        trace!(
            display = keep_display,
            "Execution-state assertion is not available on this platform"
        );
    }

    pub fn release() {
        trace!("Execution-state release is not available on this platform");
    }
}
