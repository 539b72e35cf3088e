//! Single-instance guard backed by a named system-wide lock
//!
//! On Windows this is a named mutex created with initial ownership; a second
//! creator sees `ERROR_ALREADY_EXISTS`. On Unix an exclusive non-blocking
//! `flock` on a file in the temp directory plays the same role. The lock is
//! released when the [`InstanceGuard`] is dropped.

use crate::error::Result;
use std::fmt;
use tracing::{debug, info};

/// Outcome of trying to become the running instance
#[derive(Debug)]
pub enum Acquisition {
    /// This process now owns the lock
    Acquired(InstanceGuard),
    /// Another process already holds a lock with the same name
    AlreadyRunning,
}

impl Acquisition {
    /// Whether another instance holds the lock
    pub fn is_already_running(&self) -> bool {
        matches!(self, Acquisition::AlreadyRunning)
    }
}

/// Ownership of the named instance lock
pub struct InstanceGuard {
    name: String,
    _lock: platform::Lock,
}

impl InstanceGuard {
    /// Try to create and own the lock called `name`
    ///
    /// Returns an error only when the OS refuses to create the lock at all.
    pub fn acquire(name: &str) -> Result<Acquisition> {
        match platform::try_acquire(name)? {
            Some(lock) => {
                info!("Acquired instance lock '{}'", name);
                Ok(Acquisition::Acquired(Self {
                    name: name.to_string(),
                    _lock: lock,
                }))
            }
            None => {
                debug!("Instance lock '{}' is held elsewhere", name);
                Ok(Acquisition::AlreadyRunning)
            }
        }
    }

    /// Probe whether an instance holding `name` is running right now
    pub fn is_running(name: &str) -> Result<bool> {
        Ok(Self::acquire(name)?.is_already_running())
    }

    /// Lock name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for InstanceGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceGuard")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        debug!("Releasing instance lock '{}'", self.name);
    }
}

#[cfg(windows)]
mod platform {
    use crate::error::{KeepAliveError, Result};
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use tracing::warn;
    use windows::{
        core::PCWSTR,
        Win32::{
            Foundation::{CloseHandle, GetLastError, BOOL, ERROR_ALREADY_EXISTS, HANDLE},
            System::Threading::{CreateMutexW, ReleaseMutex},
        },
    };

    pub struct Lock {
        handle: HANDLE,
    }

    pub fn try_acquire(name: &str) -> Result<Option<Lock>> {
        let wide: Vec<u16> = OsStr::new(name)
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        unsafe {
            let handle = CreateMutexW(None, BOOL::from(true), PCWSTR::from_raw(wide.as_ptr()))
                .map_err(|e| KeepAliveError::lock(name, e))?;

            // Opening an existing mutex still yields a valid handle
            if GetLastError() == ERROR_ALREADY_EXISTS {
                let _ = CloseHandle(handle);
                return Ok(None);
            }

            Ok(Some(Lock { handle }))
        }
    }

    impl Drop for Lock {
        fn drop(&mut self) {
            unsafe {
                if let Err(e) = ReleaseMutex(self.handle) {
                    warn!("Failed to release instance mutex: {}", e);
                }
                let _ = CloseHandle(self.handle);
            }
        }
    }
}

#[cfg(unix)]
mod platform {
    use crate::error::{KeepAliveError, Result};
    use std::fs::{File, OpenOptions};
    use std::io;
    use std::os::unix::io::AsRawFd;
    use std::path::PathBuf;

    pub struct Lock {
        // flock is released when the descriptor closes
        _file: File,
    }

    pub fn try_acquire(name: &str) -> Result<Option<Lock>> {
        let path = lock_path(name);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| KeepAliveError::lock(name, e))?;

        let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if result == 0 {
            return Ok(Some(Lock { _file: file }));
        }

        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::WouldBlock || err.raw_os_error() == Some(libc::EWOULDBLOCK)
        {
            return Ok(None);
        }
        Err(KeepAliveError::lock(name, err))
    }

    fn lock_path(name: &str) -> PathBuf {
        let file_name: String = name
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        std::env::temp_dir().join(format!("{}.lock", file_name))
    }
}

#[cfg(not(any(windows, unix)))]
mod platform {
    use crate::error::Result;

    pub struct Lock;

    pub fn try_acquire(_name: &str) -> Result<Option<Lock>> {
        Ok(Some(Lock))
    }
}
