//! In-memory partitioned log for testing.

use crate::error::{LogError, LogResult};
use crate::log::PartitionedLog;
use crate::record::{validate_topic_name, LogRecord, TopicPartition};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct MemoryPartition {
    /// Offset of `records[0]`, or the next offset when empty.
    base_offset: u64,
    records: VecDeque<LogRecord>,
}

impl MemoryPartition {
    fn end_offset(&self) -> u64 {
        self.base_offset + self.records.len() as u64
    }
}

/// An in-memory partitioned log.
///
/// This log keeps all records in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral deployments that don't need persistence
///
/// # Thread Safety
///
/// Each partition has its own lock, so appends to different partitions do
/// not contend.
///
/// # Example
///
/// ```rust
/// use raas_log::{InMemoryLog, PartitionedLog, TopicPartition};
/// use std::time::Duration;
///
/// let log = InMemoryLog::new();
/// log.create_topic("alarms", 2).unwrap();
/// let tp = TopicPartition::new("alarms", 1);
/// let offset = log.append(&tp, "kota", Some(b"{}"), 0, Duration::from_secs(1)).unwrap();
/// assert_eq!(offset, 0);
/// assert_eq!(log.end_offset(&tp).unwrap(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryLog {
    topics: RwLock<HashMap<String, Vec<Arc<Mutex<MemoryPartition>>>>>,
}

impl InMemoryLog {
    /// Creates a new empty in-memory log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of retained records across all topics.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.topics
            .read()
            .values()
            .flatten()
            .map(|p| p.lock().records.len())
            .sum()
    }

    fn partition(&self, tp: &TopicPartition) -> LogResult<Arc<Mutex<MemoryPartition>>> {
        self.topics
            .read()
            .get(&tp.topic)
            .and_then(|partitions| partitions.get(tp.partition as usize))
            .cloned()
            .ok_or_else(|| LogError::UnknownPartition(tp.clone()))
    }
}

impl PartitionedLog for InMemoryLog {
    fn create_topic(&self, topic: &str, partitions: u32) -> LogResult<u32> {
        validate_topic_name(topic)?;
        if partitions == 0 {
            return Err(LogError::InvalidTopic(format!(
                "topic {topic} needs at least one partition"
            )));
        }

        let mut topics = self.topics.write();
        if let Some(existing) = topics.get(topic) {
            return Ok(existing.len() as u32);
        }
        let created = (0..partitions)
            .map(|_| Arc::new(Mutex::new(MemoryPartition::default())))
            .collect();
        topics.insert(topic.to_string(), created);
        Ok(partitions)
    }

    fn partition_count(&self, topic: &str) -> LogResult<Option<u32>> {
        Ok(self.topics.read().get(topic).map(|p| p.len() as u32))
    }

    fn topics(&self) -> LogResult<Vec<String>> {
        let mut names: Vec<String> = self.topics.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn append(
        &self,
        tp: &TopicPartition,
        key: &str,
        value: Option<&[u8]>,
        timestamp_ms: u64,
        ack_timeout: Duration,
    ) -> LogResult<u64> {
        let partition = self.partition(tp)?;
        let mut data = partition
            .try_lock_for(ack_timeout)
            .ok_or_else(|| LogError::AckTimeout {
                topic_partition: tp.clone(),
                timeout: ack_timeout,
            })?;

        let offset = data.end_offset();
        data.records.push_back(LogRecord {
            offset,
            timestamp_ms,
            key: key.to_string(),
            value: value.map(<[u8]>::to_vec),
        });
        Ok(offset)
    }

    fn fetch(
        &self,
        tp: &TopicPartition,
        offset: u64,
        max_records: usize,
        timeout: Duration,
    ) -> LogResult<Vec<LogRecord>> {
        let partition = self.partition(tp)?;
        let Some(data) = partition.try_lock_for(timeout) else {
            return Ok(Vec::new());
        };

        let skip = offset.saturating_sub(data.base_offset) as usize;
        Ok(data
            .records
            .iter()
            .skip(skip)
            .take(max_records)
            .cloned()
            .collect())
    }

    fn start_offset(&self, tp: &TopicPartition) -> LogResult<u64> {
        Ok(self.partition(tp)?.lock().base_offset)
    }

    fn end_offset(&self, tp: &TopicPartition) -> LogResult<u64> {
        Ok(self.partition(tp)?.lock().end_offset())
    }

    fn expire_before(&self, tp: &TopicPartition, cutoff_ms: u64) -> LogResult<u64> {
        let partition = self.partition(tp)?;
        let mut data = partition.lock();

        let mut removed = 0;
        while data
            .records
            .front()
            .is_some_and(|r| r.timestamp_ms < cutoff_ms)
        {
            data.records.pop_front();
            data.base_offset += 1;
            removed += 1;
        }
        Ok(removed)
    }
}
