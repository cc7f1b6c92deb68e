//! Synchronous log producer.

use crate::error::LogResult;
use crate::log::PartitionedLog;
use crate::record::{now_millis, TopicPartition};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Sends keyed records to a [`PartitionedLog`] and waits for each one to be
/// acknowledged.
///
/// There is exactly one write outstanding per call and nothing is retried:
/// a failed or unacknowledged append is returned to the caller.
pub struct LogProducer {
    log: Arc<dyn PartitionedLog>,
    ack_timeout: Duration,
}

impl LogProducer {
    /// Creates a producer that waits at most `ack_timeout` per append.
    pub fn new(log: Arc<dyn PartitionedLog>, ack_timeout: Duration) -> Self {
        Self { log, ack_timeout }
    }

    /// Returns the acknowledgement timeout.
    #[must_use]
    pub fn ack_timeout(&self) -> Duration {
        self.ack_timeout
    }

    /// Appends a record stamped with the current time; `None` sends a
    /// tombstone. Returns the offset of the acknowledged record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LogError::AckTimeout`] if the append is not
    /// acknowledged in time, or the log's error if the append fails.
    pub fn send(&self, tp: &TopicPartition, key: &str, value: Option<&[u8]>) -> LogResult<u64> {
        let offset = self
            .log
            .append(tp, key, value, now_millis(), self.ack_timeout)?;
        debug!(partition = %tp, key, offset, tombstone = value.is_none(), "record acknowledged");
        Ok(offset)
    }
}
