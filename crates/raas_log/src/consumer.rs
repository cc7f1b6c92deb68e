//! Single-partition log consumer with an explicit seek position.

use crate::error::{LogError, LogResult};
use crate::log::PartitionedLog;
use crate::record::{LogRecord, TopicPartition};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Configuration for a [`LogConsumer`].
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Prefix of the generated subscriber identity.
    pub subscriber_prefix: String,
    /// Maximum number of records returned by one poll.
    pub max_poll_records: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            subscriber_prefix: "raas".to_string(),
            max_poll_records: 500,
        }
    }
}

/// Reads records from one assigned partition, starting at a seek position.
///
/// Every consumer gets a fresh subscriber identity that is never reused, so
/// independent consumers never share any coordination state. The assignment
/// and position are plain mutable state: a consumer is meant to be driven by
/// one caller at a time.
pub struct LogConsumer {
    log: Arc<dyn PartitionedLog>,
    subscriber_id: String,
    max_poll_records: usize,
    assignment: Option<TopicPartition>,
    position: u64,
}

impl LogConsumer {
    /// Creates an unassigned consumer.
    pub fn new(log: Arc<dyn PartitionedLog>, config: &ConsumerConfig) -> Self {
        Self {
            log,
            subscriber_id: format!("{}-{}", config.subscriber_prefix, Uuid::new_v4()),
            max_poll_records: config.max_poll_records.max(1),
            assignment: None,
            position: 0,
        }
    }

    /// Returns this consumer's subscriber identity.
    #[must_use]
    pub fn subscriber_id(&self) -> &str {
        &self.subscriber_id
    }

    /// Returns the assigned partition, if any.
    #[must_use]
    pub fn assignment(&self) -> Option<&TopicPartition> {
        self.assignment.as_ref()
    }

    /// Assigns a partition and positions at its start.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition does not exist.
    pub fn assign(&mut self, tp: TopicPartition) -> LogResult<()> {
        self.position = self.log.start_offset(&tp)?;
        self.assignment = Some(tp);
        Ok(())
    }

    /// Moves the position to the first retained record.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::NotAssigned`] if no partition is assigned.
    pub fn seek_to_beginning(&mut self) -> LogResult<()> {
        let tp = self.assigned()?;
        self.position = self.log.start_offset(tp)?;
        Ok(())
    }

    /// Moves the position to `offset`.
    ///
    /// An offset below the first retained record resumes at that record.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::NotAssigned`] if no partition is assigned.
    pub fn seek(&mut self, offset: u64) -> LogResult<()> {
        let tp = self.assigned()?;
        let start = self.log.start_offset(tp)?;
        self.position = offset.max(start);
        Ok(())
    }

    /// Returns the offset of the next record to be polled.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::NotAssigned`] if no partition is assigned.
    pub fn position(&self) -> LogResult<u64> {
        self.assigned()?;
        Ok(self.position)
    }

    /// Returns the end offset (high-water mark) of `tp`.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition does not exist.
    pub fn end_offset(&self, tp: &TopicPartition) -> LogResult<u64> {
        self.log.end_offset(tp)
    }

    /// Fetches the next batch of records and advances past them.
    ///
    /// An empty batch means no records are readable right now.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::NotAssigned`] if no partition is assigned, or the
    /// log's error if the read fails.
    pub fn poll(&mut self, timeout: Duration) -> LogResult<Vec<LogRecord>> {
        let tp = self.assignment.as_ref().ok_or(LogError::NotAssigned)?;
        let records = self
            .log
            .fetch(tp, self.position, self.max_poll_records, timeout)?;
        if let Some(last) = records.last() {
            self.position = last.offset + 1;
        }
        debug!(
            subscriber = %self.subscriber_id,
            partition = %tp,
            count = records.len(),
            position = self.position,
            "poll"
        );
        Ok(records)
    }

    fn assigned(&self) -> LogResult<&TopicPartition> {
        self.assignment.as_ref().ok_or(LogError::NotAssigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryLog;

    const POLL: Duration = Duration::from_millis(100);
    const ACK: Duration = Duration::from_secs(1);

    fn filled_log(keys: &[&str]) -> (Arc<InMemoryLog>, TopicPartition) {
        let log = Arc::new(InMemoryLog::new());
        log.create_topic("alarms", 1).unwrap();
        let tp = TopicPartition::new("alarms", 0);
        for (i, key) in keys.iter().enumerate() {
            log.append(&tp, key, Some(b"{}"), i as u64, ACK).unwrap();
        }
        (log, tp)
    }

    #[test]
    fn subscriber_ids_are_unique() {
        let log: Arc<dyn PartitionedLog> = Arc::new(InMemoryLog::new());
        let a = LogConsumer::new(Arc::clone(&log), &ConsumerConfig::default());
        let b = LogConsumer::new(log, &ConsumerConfig::default());
        assert_ne!(a.subscriber_id(), b.subscriber_id());
        assert!(a.subscriber_id().starts_with("raas-"));
    }

    #[test]
    fn unassigned_consumer_fails() {
        let mut consumer =
            LogConsumer::new(Arc::new(InMemoryLog::new()), &ConsumerConfig::default());
        assert!(matches!(consumer.poll(POLL), Err(LogError::NotAssigned)));
        assert!(matches!(consumer.seek(3), Err(LogError::NotAssigned)));
        assert!(matches!(consumer.position(), Err(LogError::NotAssigned)));
    }

    #[test]
    fn poll_respects_max_records_and_advances() {
        let (log, tp) = filled_log(&["a", "b", "c"]);
        let config = ConsumerConfig {
            max_poll_records: 2,
            ..ConsumerConfig::default()
        };
        let mut consumer = LogConsumer::new(log, &config);
        consumer.assign(tp).unwrap();

        assert_eq!(consumer.poll(POLL).unwrap().len(), 2);
        assert_eq!(consumer.position().unwrap(), 2);
        assert_eq!(consumer.poll(POLL).unwrap().len(), 1);
        assert!(consumer.poll(POLL).unwrap().is_empty());
        assert_eq!(consumer.position().unwrap(), 3);
    }

    #[test]
    fn seek_and_rewind() {
        let (log, tp) = filled_log(&["a", "b", "c"]);
        let mut consumer = LogConsumer::new(log, &ConsumerConfig::default());
        consumer.assign(tp).unwrap();

        consumer.seek(2).unwrap();
        let records = consumer.poll(POLL).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "c");

        consumer.seek_to_beginning().unwrap();
        assert_eq!(consumer.poll(POLL).unwrap().len(), 3);
    }

    #[test]
    fn seek_below_start_resumes_at_start() {
        let (log, tp) = filled_log(&["a", "b", "c"]);
        log.expire_before(&tp, 2).unwrap();

        let mut consumer = LogConsumer::new(log, &ConsumerConfig::default());
        consumer.assign(tp).unwrap();
        consumer.seek(0).unwrap();
        assert_eq!(consumer.position().unwrap(), 2);
        assert_eq!(consumer.poll(POLL).unwrap()[0].key, "c");
    }
}
