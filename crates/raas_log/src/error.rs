//! Error types for log operations.

use crate::record::TopicPartition;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for log operations.
pub type LogResult<T> = Result<T, LogError>;

/// Errors that can occur during log operations.
#[derive(Debug, Error)]
pub enum LogError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A partition file or a record frame is corrupted.
    #[error("log corrupted: {0}")]
    Corrupted(String),

    /// The topic name is not usable, or the topic definition is invalid.
    #[error("invalid topic: {0}")]
    InvalidTopic(String),

    /// The topic or the partition does not exist.
    #[error("unknown partition {0}")]
    UnknownPartition(TopicPartition),

    /// An append was not acknowledged in time.
    #[error("append to {topic_partition} not acknowledged within {timeout:?}")]
    AckTimeout {
        /// The partition the record was sent to.
        topic_partition: TopicPartition,
        /// The acknowledgement timeout that elapsed.
        timeout: Duration,
    },

    /// Another process owns the log directory.
    #[error("log directory locked: {}", .0.display())]
    Locked(PathBuf),

    /// The consumer has no partition assigned.
    #[error("consumer has no partition assigned")]
    NotAssigned,
}

impl LogError {
    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }

    /// Returns true if retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::AckTimeout { .. } | Self::Io(_))
    }
}
