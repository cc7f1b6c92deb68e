//! Error types for the alarm store.

use raas_log::LogError;
use thiserror::Error;

/// Result type for store operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Log error outside of an acknowledged write.
    #[error("log error: {0}")]
    Log(#[from] LogError),

    /// A write was not confirmed by the log.
    ///
    /// Never retried by the store; retrying is the caller's decision.
    #[error("failed to save alarm {notification_id:?}: {source}")]
    WriteAcknowledgement {
        /// The alarm that was being written.
        notification_id: String,
        /// The underlying log failure.
        #[source]
        source: LogError,
    },

    /// A value is not in the expected format.
    #[error("unsupported value: {message}")]
    ValueFormat {
        /// Description of the format issue.
        message: String,
    },

    /// A cursor that the backend could not have issued.
    #[error("invalid cursor {cursor:?}")]
    InvalidCursor {
        /// The rejected cursor.
        cursor: String,
    },

    /// The subpartition does not exist in the partition.
    #[error("unknown subpartition {subpartition:?} (partition has {available})")]
    UnknownSubpartition {
        /// The requested subpartition name.
        subpartition: String,
        /// Number of subpartitions the partition has.
        available: u32,
    },

    /// Invalid store configuration.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },
}

impl CoreError {
    /// Creates a value format error.
    pub fn value_format(message: impl Into<String>) -> Self {
        Self::ValueFormat {
            message: message.into(),
        }
    }

    /// Creates an invalid cursor error.
    pub fn invalid_cursor(cursor: impl Into<String>) -> Self {
        Self::InvalidCursor {
            cursor: cursor.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if the error was caused by the caller's input rather
    /// than by the backend.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::ValueFormat { .. } | Self::InvalidCursor { .. } | Self::UnknownSubpartition { .. }
        )
    }
}
