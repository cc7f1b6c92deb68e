//! Log-backed store.
//!
//! Every partition is a topic of a [`PartitionedLog`]; every subpartition is
//! one partition of that topic. A write appends a keyed record (a tombstone
//! for deletes) and waits for its acknowledgement. A read replays the
//! subpartition from the cursor offset and deduplicates what it reads.
//!
//! ## Cursors
//!
//! A cursor is the decimal offset of the first record the next pack reads.
//! It is issued only while records remain below the end offset observed when
//! the pack was requested, so a traversal terminates even under a steady
//! stream of writes.
//!
//! ## Retention
//!
//! Tombstones stay in the log until [`LogStore::enforce_retention`] drops
//! records older than the configured retention (one staleness window by
//! default). A traversal that outlives the retention may miss deletions.

mod staging;

use crate::config::LogStoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::store::AlarmStore;
use crate::types::{
    AlarmValue, Cursor, NotificationId, Pack, PartitionKey, Subpartition, SubpartitionLayout,
};
use parking_lot::Mutex;
use raas_log::{ConsumerConfig, LogConsumer, LogProducer, PartitionedLog, TopicPartition};
use staging::PackStaging;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Durable backend over an append-only partitioned log.
pub struct LogStore {
    log: Arc<dyn PartitionedLog>,
    producer: LogProducer,
    consumer: Mutex<LogConsumer>,
    layout: SubpartitionLayout,
    config: LogStoreConfig,
}

impl LogStore {
    /// Creates a store over `log`. New partitions get `layout`'s subpartitions.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if `config` is invalid.
    pub fn new(
        log: Arc<dyn PartitionedLog>,
        layout: SubpartitionLayout,
        config: LogStoreConfig,
    ) -> CoreResult<Self> {
        config.validate()?;
        let producer = LogProducer::new(Arc::clone(&log), config.ack_timeout);
        let consumer = LogConsumer::new(
            Arc::clone(&log),
            &ConsumerConfig {
                max_poll_records: config.max_poll_records,
                ..ConsumerConfig::default()
            },
        );
        info!(
            subscriber = consumer.subscriber_id(),
            topic_prefix = %config.topic_prefix,
            subpartitions = layout.count(),
            "log store ready"
        );
        Ok(Self {
            log,
            producer,
            consumer: Mutex::new(consumer),
            layout,
            config,
        })
    }

    /// Returns the subscriber identity of the store's consumer.
    #[must_use]
    pub fn subscriber_id(&self) -> String {
        self.consumer.lock().subscriber_id().to_string()
    }

    /// Returns the store's configuration.
    #[must_use]
    pub fn config(&self) -> &LogStoreConfig {
        &self.config
    }

    /// Returns the topic holding `partition`.
    #[must_use]
    pub fn topic_for(&self, partition: &PartitionKey) -> String {
        partition.topic_name(&self.config.topic_prefix)
    }

    /// Resolves a subpartition for writing, creating the topic if needed.
    fn writable(&self, partition: &PartitionKey, subpartition: &Subpartition) -> CoreResult<TopicPartition> {
        let topic = self.topic_for(partition);
        let count = self.log.create_topic(&topic, self.layout.count())?;
        let index = subpartition.resolve(count)?;
        Ok(TopicPartition::new(topic, index))
    }

    /// Resolves a subpartition for reading; `None` if the topic was never written.
    fn readable(
        &self,
        partition: &PartitionKey,
        subpartition: &Subpartition,
    ) -> CoreResult<Option<TopicPartition>> {
        let topic = self.topic_for(partition);
        match self.log.partition_count(&topic)? {
            Some(count) => {
                let index = subpartition.resolve(count)?;
                Ok(Some(TopicPartition::new(topic, index)))
            }
            None => {
                self.layout.resolve(subpartition)?;
                Ok(None)
            }
        }
    }

    fn retention_cutoff(&self, now_ms: u64) -> u64 {
        let retention_ms = u64::try_from(self.config.retention.as_millis()).unwrap_or(u64::MAX);
        now_ms.saturating_sub(retention_ms)
    }
}

impl AlarmStore for LogStore {
    fn backend_name(&self) -> &'static str {
        "log"
    }

    fn put(
        &self,
        partition: &PartitionKey,
        subpartition: &Subpartition,
        notification_id: &NotificationId,
        value: Option<&AlarmValue>,
    ) -> CoreResult<()> {
        let tp = self.writable(partition, subpartition)?;
        debug!(%tp, %notification_id, tombstone = value.is_none(), "save alarm - start");

        match self
            .producer
            .send(&tp, notification_id.as_str(), value.map(AlarmValue::as_bytes))
        {
            Ok(offset) => {
                info!(%tp, %notification_id, offset, tombstone = value.is_none(), "alarm saved");
                Ok(())
            }
            Err(source) => {
                warn!(%tp, %notification_id, error = %source, "failed to save alarm");
                Err(CoreError::WriteAcknowledgement {
                    notification_id: notification_id.to_string(),
                    source,
                })
            }
        }
    }

    fn get_pack(
        &self,
        partition: &PartitionKey,
        subpartition: &Subpartition,
        cursor: Option<&Cursor>,
        limit: usize,
    ) -> CoreResult<Pack> {
        let start = cursor.map(Cursor::offset).transpose()?;
        let Some(tp) = self.readable(partition, subpartition)? else {
            debug!(%partition, %subpartition, "no topic yet, empty pack");
            return Ok(Pack::empty());
        };

        let mut consumer = self.consumer.lock();
        let high_water = consumer.end_offset(&tp)?;
        consumer.assign(tp.clone())?;
        match start {
            Some(offset) => consumer.seek(offset)?,
            None => consumer.seek_to_beginning()?,
        }
        let mut reached = consumer.position()?;

        let mut staging = PackStaging::new(start.is_none(), limit);
        'fetch: while !staging.is_full() {
            let records = consumer.poll(self.config.poll_timeout)?;
            if records.is_empty() {
                break;
            }
            for record in records {
                reached = record.offset + 1;
                let value = record.value.map(AlarmValue::from_bytes).transpose()?;
                staging.offer(record.key, value);
                if staging.is_full() {
                    break 'fetch;
                }
            }
        }

        let next_cursor = (reached < high_water).then(|| Cursor::from_offset(reached));
        let pack = staging.into_pack(next_cursor);
        info!(
            %tp,
            start = start.unwrap_or_default(),
            high_water,
            size = pack.len(),
            next = pack.next_cursor().map(Cursor::as_str),
            "pack read"
        );
        Ok(pack)
    }

    fn list_subpartitions(&self, partition: &PartitionKey) -> CoreResult<Vec<Subpartition>> {
        let count = self
            .log
            .partition_count(&self.topic_for(partition))?
            .unwrap_or_else(|| self.layout.count());
        Ok((0..count).map(Subpartition::from_index).collect())
    }

    fn enforce_retention(&self, now_ms: u64) -> CoreResult<u64> {
        let cutoff = self.retention_cutoff(now_ms);
        let prefix = format!("{}.", self.config.topic_prefix);
        let mut removed = 0;
        for topic in self.log.topics()? {
            if !topic.starts_with(&prefix) {
                continue;
            }
            let count = self.log.partition_count(&topic)?.unwrap_or(0);
            for index in 0..count {
                removed += self
                    .log
                    .expire_before(&TopicPartition::new(topic.clone(), index), cutoff)?;
            }
        }
        info!(cutoff, removed, "retention enforced");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raas_log::{InMemoryLog, LogError};
    use std::time::Duration;

    fn store() -> (Arc<InMemoryLog>, LogStore) {
        let log = Arc::new(InMemoryLog::new());
        let store = LogStore::new(log.clone(), SubpartitionLayout::default(), LogStoreConfig::default())
            .unwrap();
        (log, store)
    }

    fn key() -> PartitionKey {
        PartitionKey::new("ala", "ma")
    }

    fn sub() -> Subpartition {
        Subpartition::new("0")
    }

    fn put(store: &LogStore, id: &str, value: &str) {
        store
            .put(&key(), &sub(), &id.into(), Some(&AlarmValue::new(value)))
            .unwrap();
    }

    fn delete(store: &LogStore, id: &str) {
        store.delete(&key(), &sub(), &id.into()).unwrap();
    }

    fn ids(pack: &Pack) -> Vec<&str> {
        pack.notification_ids().iter().map(NotificationId::as_str).collect()
    }

    #[test]
    fn first_pack_is_deduplicated() {
        let (_, store) = store();
        for id in ["a", "b", "c"] {
            put(&store, id, "{}");
        }
        for id in ["a", "b", "c"] {
            delete(&store, id);
        }
        for id in ["a", "b", "c"] {
            put(&store, id, "{}");
        }

        let pack = store.get_pack(&key(), &sub(), None, 100).unwrap();
        assert_eq!(ids(&pack), vec!["a", "b", "c"]);
        assert!(pack.next_cursor().is_none());

        put(&store, "a", r#"{"v":2}"#);
        let pack = store.get_pack(&key(), &sub(), None, 100).unwrap();
        assert_eq!(ids(&pack), vec!["b", "c", "a"]);

        let first = store.get_pack(&key(), &sub(), None, 2).unwrap();
        assert_eq!(ids(&first), vec!["a", "b"]);
        assert_eq!(first.next_cursor().map(Cursor::as_str), Some("2"));

        let rest = store.get_pack(&key(), &sub(), first.next_cursor(), 5).unwrap();
        assert_eq!(ids(&rest), vec!["b", "c", "a"]);
        assert!(rest.next_cursor().is_none());
    }

    #[test]
    fn later_packs_carry_tombstones() {
        let (_, store) = store();
        put(&store, "a", "{}");
        put(&store, "b", "{}");
        delete(&store, "a");

        let first = store.get_pack(&key(), &sub(), None, 1).unwrap();
        assert_eq!(ids(&first), vec!["a"]);
        let second = store.get_pack(&key(), &sub(), first.next_cursor(), 10).unwrap();
        assert_eq!(ids(&second), vec!["b", "a"]);
        assert_eq!(second.values()[1], None);
        assert!(second.next_cursor().is_none());
    }

    #[test]
    fn missing_topic_reads_empty() {
        let (log, store) = store();
        let pack = store.get_pack(&key(), &sub(), None, 10).unwrap();
        assert!(pack.is_empty());
        assert!(pack.next_cursor().is_none());
        assert!(log.topics().unwrap().is_empty());
    }

    #[test]
    fn put_creates_topic_with_layout() {
        let log = Arc::new(InMemoryLog::new());
        let store = LogStore::new(
            log.clone(),
            SubpartitionLayout::new(3).unwrap(),
            LogStoreConfig::default(),
        )
        .unwrap();
        store
            .put(&key(), &"2".into(), &"a".into(), Some(&AlarmValue::new("{}")))
            .unwrap();
        assert_eq!(log.partition_count("tc_raw_active_alarms.ala.ma").unwrap(), Some(3));
        assert_eq!(store.list_subpartitions(&key()).unwrap().len(), 3);
    }

    #[test]
    fn existing_topic_count_wins_over_layout() {
        let log = Arc::new(InMemoryLog::new());
        log.create_topic("tc_raw_active_alarms.ala.ma", 2).unwrap();
        let store = LogStore::new(
            log,
            SubpartitionLayout::new(5).unwrap(),
            LogStoreConfig::default(),
        )
        .unwrap();

        assert_eq!(store.list_subpartitions(&key()).unwrap().len(), 2);
        let result = store.put(&key(), &"4".into(), &"a".into(), Some(&AlarmValue::new("{}")));
        assert!(matches!(result, Err(CoreError::UnknownSubpartition { available: 2, .. })));
        let result = store.get_pack(&key(), &"3".into(), None, 10);
        assert!(matches!(result, Err(CoreError::UnknownSubpartition { .. })));
    }

    #[test]
    fn invalid_cursor_is_rejected() {
        let (_, store) = store();
        put(&store, "a", "{}");
        let result = store.get_pack(&key(), &sub(), Some(&Cursor::new("kota")), 10);
        assert!(matches!(result, Err(CoreError::InvalidCursor { .. })));
    }

    #[test]
    fn zero_limit_returns_start_cursor() {
        let (_, store) = store();
        put(&store, "a", "{}");
        let pack = store.get_pack(&key(), &sub(), None, 0).unwrap();
        assert!(pack.is_empty());
        assert_eq!(pack.next_cursor().map(Cursor::as_str), Some("0"));
    }

    #[test]
    fn cursor_past_end_is_final() {
        let (_, store) = store();
        put(&store, "a", "{}");
        let pack = store.get_pack(&key(), &sub(), Some(&Cursor::from_offset(99)), 10).unwrap();
        assert!(pack.is_empty());
        assert!(pack.next_cursor().is_none());
    }

    #[test]
    fn non_utf8_record_is_a_value_error() {
        let (log, store) = store();
        put(&store, "a", "{}");
        let tp = TopicPartition::new(store.topic_for(&key()), 0);
        log.append(&tp, "b", Some(&[0xff, 0xfe]), 0, Duration::from_secs(1))
            .unwrap();

        let result = store.get_pack(&key(), &sub(), None, 10);
        assert!(matches!(result, Err(CoreError::ValueFormat { .. })));
    }

    #[test]
    fn retention_drops_old_records() {
        let log = Arc::new(InMemoryLog::new());
        let store = LogStore::new(
            log.clone(),
            SubpartitionLayout::default(),
            LogStoreConfig::default().retention(Duration::from_millis(10)),
        )
        .unwrap();
        let tp = TopicPartition::new(store.topic_for(&key()), 0);
        log.create_topic(&tp.topic, 1).unwrap();
        log.append(&tp, "a", Some(b"{}"), 100, Duration::from_secs(1)).unwrap();
        log.append(&tp, "a", None, 105, Duration::from_secs(1)).unwrap();
        log.append(&tp, "b", Some(b"{}"), 200, Duration::from_secs(1)).unwrap();
        log.create_topic("unrelated", 1).unwrap();
        log.append(&TopicPartition::new("unrelated", 0), "x", None, 0, Duration::from_secs(1))
            .unwrap();

        assert_eq!(store.enforce_retention(150).unwrap(), 2);
        assert_eq!(log.start_offset(&tp).unwrap(), 2);
        assert_eq!(log.end_offset(&TopicPartition::new("unrelated", 0)).unwrap(), 1);

        let old = store.get_pack(&key(), &sub(), Some(&Cursor::from_offset(0)), 10).unwrap();
        assert_eq!(ids(&old), vec!["b"]);
    }

    #[test]
    fn file_log_keeps_cursor_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let open = || {
            let log = Arc::new(raas_log::FileLog::open(dir.path()).unwrap());
            LogStore::new(log, SubpartitionLayout::default(), LogStoreConfig::default()).unwrap()
        };

        let store = open();
        for id in ["a", "b", "c"] {
            put(&store, id, "{}");
        }
        delete(&store, "b");
        let first = store.get_pack(&key(), &sub(), None, 1).unwrap();
        assert_eq!(ids(&first), vec!["a"]);
        let cursor = first.next_cursor().cloned().unwrap();
        drop(store);

        let store = open();
        let rest = store.get_pack(&key(), &sub(), Some(&cursor), 10).unwrap();
        assert_eq!(ids(&rest), vec!["c", "b"]);
        assert_eq!(rest.values()[1], None);
        assert!(rest.next_cursor().is_none());
    }

    #[test]
    fn failed_write_is_reported() {
        struct RefusingLog;

        impl PartitionedLog for RefusingLog {
            fn create_topic(&self, _topic: &str, partitions: u32) -> raas_log::LogResult<u32> {
                Ok(partitions)
            }
            fn partition_count(&self, _topic: &str) -> raas_log::LogResult<Option<u32>> {
                Ok(Some(1))
            }
            fn topics(&self) -> raas_log::LogResult<Vec<String>> {
                Ok(Vec::new())
            }
            fn append(
                &self,
                tp: &TopicPartition,
                _key: &str,
                _value: Option<&[u8]>,
                _timestamp_ms: u64,
                ack_timeout: Duration,
            ) -> raas_log::LogResult<u64> {
                Err(LogError::AckTimeout {
                    topic_partition: tp.clone(),
                    timeout: ack_timeout,
                })
            }
            fn fetch(
                &self,
                _tp: &TopicPartition,
                _offset: u64,
                _max_records: usize,
                _timeout: Duration,
            ) -> raas_log::LogResult<Vec<raas_log::LogRecord>> {
                Ok(Vec::new())
            }
            fn start_offset(&self, _tp: &TopicPartition) -> raas_log::LogResult<u64> {
                Ok(0)
            }
            fn end_offset(&self, _tp: &TopicPartition) -> raas_log::LogResult<u64> {
                Ok(0)
            }
            fn expire_before(&self, _tp: &TopicPartition, _cutoff_ms: u64) -> raas_log::LogResult<u64> {
                Ok(0)
            }
        }

        let store = LogStore::new(
            Arc::new(RefusingLog),
            SubpartitionLayout::default(),
            LogStoreConfig::default(),
        )
        .unwrap();
        let result = store.put(&key(), &sub(), &"a".into(), Some(&AlarmValue::new("{}")));
        match result {
            Err(CoreError::WriteAcknowledgement { notification_id, source }) => {
                assert_eq!(notification_id, "a");
                assert!(source.is_transient());
            }
            other => panic!("expected write acknowledgement error, got {other:?}"),
        }
    }
}
