//! Partitioned log trait definition.

use crate::error::LogResult;
use crate::record::{LogRecord, TopicPartition};
use std::time::Duration;

/// An append-only, offset-addressed, partitioned log.
///
/// # Invariants
///
/// - Offsets within a partition are dense and strictly increasing
/// - `append` returns the offset the record was stored at, which equals the
///   partition's `end_offset` just before the call
/// - Records are never rewritten; retention only removes a prefix
/// - `start_offset <= end_offset`; both only ever grow
///
/// # Implementors
///
/// - [`super::InMemoryLog`] - For testing
/// - [`super::FileLog`] - For persistent storage
pub trait PartitionedLog: Send + Sync {
    /// Creates a topic with `partitions` partitions.
    ///
    /// Creating an existing topic is not an error: the existing partition
    /// count is returned and the requested one is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the topic name is invalid, `partitions` is zero,
    /// or the topic cannot be materialized.
    fn create_topic(&self, topic: &str, partitions: u32) -> LogResult<u32>;

    /// Returns the partition count of `topic`, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the count cannot be determined.
    fn partition_count(&self, topic: &str) -> LogResult<Option<u32>>;

    /// Returns the names of all topics.
    ///
    /// # Errors
    ///
    /// Returns an error if the topics cannot be listed.
    fn topics(&self) -> LogResult<Vec<String>>;

    /// Appends a record and waits for it to be acknowledged.
    ///
    /// A `None` value appends a tombstone.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LogError::AckTimeout`] if the partition could not be
    /// written within `ack_timeout`, or an error if the partition does not
    /// exist or the write fails.
    fn append(
        &self,
        tp: &TopicPartition,
        key: &str,
        value: Option<&[u8]>,
        timestamp_ms: u64,
        ack_timeout: Duration,
    ) -> LogResult<u64>;

    /// Reads up to `max_records` records starting at `offset`.
    ///
    /// An `offset` below the partition start reads from the start. An empty
    /// result means there is nothing to read right now: either `offset` is at
    /// or past the end, or the partition could not be read within `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition does not exist or the read fails.
    fn fetch(
        &self,
        tp: &TopicPartition,
        offset: u64,
        max_records: usize,
        timeout: Duration,
    ) -> LogResult<Vec<LogRecord>>;

    /// Returns the offset of the first retained record.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition does not exist.
    fn start_offset(&self, tp: &TopicPartition) -> LogResult<u64>;

    /// Returns the offset the next appended record will receive.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition does not exist.
    fn end_offset(&self, tp: &TopicPartition) -> LogResult<u64>;

    /// Removes the leading records appended before `cutoff_ms`.
    ///
    /// Stops at the first record whose timestamp is not older than the
    /// cutoff. Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition does not exist or cannot be rewritten.
    fn expire_before(&self, tp: &TopicPartition, cutoff_ms: u64) -> LogResult<u64>;
}
