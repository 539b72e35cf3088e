//! Unified error types for keepalive

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for keepalive operations
#[derive(Error, Debug)]
pub enum KeepAliveError {
    /// Configuration could not be loaded, saved or validated
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The single-instance lock could not be created
    #[error("Failed to create instance lock '{name}': {message}")]
    Lock { name: String, message: String },

    /// Console stop handler could not be installed
    #[error("Failed to install stop handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

/// Result type alias for keepalive operations
pub type Result<T> = std::result::Result<T, KeepAliveError>;

impl KeepAliveError {
    /// Create a lock error with context
    pub fn lock(name: impl Into<String>, message: impl ToString) -> Self {
        Self::Lock {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// Check if this error comes from user configuration
    pub fn is_config(&self) -> bool {
        matches!(self, KeepAliveError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_error_message() {
        let err = KeepAliveError::lock("KeepAliveMutex", "access denied");
        assert_eq!(
            err.to_string(),
            "Failed to create instance lock 'KeepAliveMutex': access denied"
        );
        assert!(!err.is_config());
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err: KeepAliveError = ConfigError::InvalidValue {
            field: "interval_secs",
            message: "must be greater than zero".to_string(),
        }
        .into();
        assert!(err.is_config());
        assert_eq!(
            err.to_string(),
            "Invalid value for interval_secs: must be greater than zero"
        );
    }
}
