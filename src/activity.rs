//! Append-only activity log
//!
//! Each entry is one line, `YYYY-M-D H:M:S - message`, stamped with local
//! wall-clock time and no zero padding (`2024-3-5 9:5:7`). The file is opened and closed on every write so no handle
//! is held between heartbeats. Write failures never reach the caller; they are
//! reported through tracing and counted in [`LogStatus`].

use chrono::{Local, NaiveDateTime};
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const TIMESTAMP_FORMAT: &str = "%Y-%-m-%-d %-H:%-M:%-S";

/// Write statistics for the activity log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogStatus {
    /// Entries appended successfully
    pub written: u64,
    /// Entries dropped because the file could not be written
    pub failures: u64,
    /// Description of the most recent failure
    pub last_error: Option<String>,
}

/// Activity logger bound to a single file
#[derive(Debug)]
pub struct ActivityLog {
    path: PathBuf,
    status: Mutex<LogStatus>,
}

/// Render one log line (without trailing newline)
pub fn format_entry(timestamp: &NaiveDateTime, message: &str) -> String {
    format!("{} - {}", timestamp.format(TIMESTAMP_FORMAT), message)
}

impl ActivityLog {
    /// Create a logger writing to `path`; nothing is opened until the first entry
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            status: Mutex::new(LogStatus::default()),
        }
    }

    /// Log file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry stamped with the current local time
    pub fn log(&self, message: &str) {
        self.log_at(&Local::now().naive_local(), message);
    }

    /// Append an entry with an explicit timestamp
    pub fn log_at(&self, timestamp: &NaiveDateTime, message: &str) {
        let line = format_entry(timestamp, message);

        match self.append(&line) {
            Ok(()) => {
                self.status.lock().written += 1;
                info!("{}", message);
            }
            Err(e) => {
                warn!("Failed to write activity log {:?}: {}", self.path, e);
                let mut status = self.status.lock();
                status.failures += 1;
                status.last_error = Some(e.to_string());
            }
        }
    }

    /// Snapshot of write statistics
    pub fn status(&self) -> LogStatus {
        self.status.lock().clone()
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_entry_format() {
        assert_eq!(
            format_entry(&at(9, 5, 7), "Keep-awake enabled"),
            "2024-3-5 9:5:7 - Keep-awake enabled"
        );
        assert_eq!(format_entry(&at(23, 59, 0), "x"), "2024-3-5 23:59:0 - x");
        assert_eq!(format_entry(&at(0, 10, 30), "x"), "2024-3-5 0:10:30 - x");
    }

    #[test]
    fn test_appends_without_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keep_alive.log");
        std::fs::write(&path, "earlier line\n").unwrap();

        let log = ActivityLog::new(&path);
        log.log_at(&at(10, 0, 0), "first");
        log.log_at(&at(10, 10, 0), "second");
        log.log("third");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "earlier line");
        assert_eq!(lines[1], "2024-3-5 10:0:0 - first");
        assert_eq!(lines[2], "2024-3-5 10:10:0 - second");
        assert!(lines[3].ends_with(" - third"));

        let status = log.status();
        assert_eq!(status.written, 3);
        assert_eq!(status.failures, 0);
    }

    #[test]
    fn test_current_time_line_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shape.log");
        let log = ActivityLog::new(&path);
        log.log("heartbeat");

        let content = std::fs::read_to_string(&path).unwrap();
        let (stamp, message) = content.trim_end().split_once(" - ").unwrap();
        assert_eq!(message, "heartbeat");
        assert!(NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn test_unwritable_path_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("keep_alive.log");
        let log = ActivityLog::new(&path);

        log.log("lost");
        log.log("also lost");

        assert!(!path.exists());
        let status = log.status();
        assert_eq!(status.written, 0);
        assert_eq!(status.failures, 2);
        assert!(status.last_error.is_some());
    }
}
