//! # RAAS Log
//!
//! Partitioned, offset-addressed, append-only log used by the raw active
//! alarms store.
//!
//! A log holds named **topics**, each split into a fixed number of
//! **partitions**. Every partition is an ordered sequence of keyed records
//! addressed by a dense `u64` offset. Records are never rewritten or
//! compacted by key: an update or a deletion (tombstone) is just another
//! record. The only thing that ever removes records is time-based retention,
//! which drops a prefix of a partition and leaves the offsets of the surviving
//! records untouched.
//!
//! ## Design Principles
//!
//! - Logs know nothing about alarms; keys are strings, values are opaque bytes
//! - A tombstone is a record without a value
//! - Appends are acknowledged synchronously or fail with [`LogError::AckTimeout`]
//! - Implementations must be `Send + Sync`
//!
//! ## Available Logs
//!
//! - [`InMemoryLog`] - For testing and ephemeral deployments
//! - [`FileLog`] - Durable log with one file per partition
//!
//! ## Example
//!
//! ```rust
//! use raas_log::{InMemoryLog, LogConsumer, ConsumerConfig, LogProducer, PartitionedLog, TopicPartition};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let log: Arc<dyn PartitionedLog> = Arc::new(InMemoryLog::new());
//! log.create_topic("alarms", 1).unwrap();
//! let tp = TopicPartition::new("alarms", 0);
//!
//! let producer = LogProducer::new(Arc::clone(&log), Duration::from_secs(1));
//! producer.send(&tp, "a", Some(b"{}")).unwrap();
//! producer.send(&tp, "a", None).unwrap();
//!
//! let mut consumer = LogConsumer::new(log, &ConsumerConfig::default());
//! consumer.assign(tp).unwrap();
//! let records = consumer.poll(Duration::from_millis(100)).unwrap();
//! assert_eq!(records.len(), 2);
//! assert!(records[1].is_tombstone());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used)]

mod consumer;
mod error;
mod file;
mod log;
mod memory;
mod producer;
mod record;

pub use consumer::{ConsumerConfig, LogConsumer};
pub use error::{LogError, LogResult};
pub use file::{FileLog, FileLogConfig};
pub use log::PartitionedLog;
pub use memory::InMemoryLog;
pub use producer::LogProducer;
pub use record::{compute_crc32, now_millis, validate_topic_name, LogRecord, TopicPartition};
