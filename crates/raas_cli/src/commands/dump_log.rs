//! Dump log command implementation.

use super::{CliError, StoreArgs};
use raas_core::{BackendKind, LogStoreConfig, Subpartition};
use raas_log::{LogRecord, PartitionedLog, TopicPartition};
use serde::Serialize;
use std::time::Duration;

const FETCH_BATCH: usize = 500;
const FETCH_TIMEOUT: Duration = Duration::from_secs(1);

/// Log record representation for output.
#[derive(Debug, Serialize)]
pub struct LogRecordInfo {
    /// Record offset.
    pub offset: u64,
    /// Append time in milliseconds since the epoch.
    pub timestamp_ms: u64,
    /// Notification identifier.
    pub key: String,
    /// Whether the record is a tombstone.
    pub tombstone: bool,
    /// Value text (lossy for non-UTF-8 payloads).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl From<LogRecord> for LogRecordInfo {
    fn from(record: LogRecord) -> Self {
        Self {
            offset: record.offset,
            timestamp_ms: record.timestamp_ms,
            tombstone: record.is_tombstone(),
            value: record
                .value
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
            key: record.key,
        }
    }
}

/// Runs the dump-log command.
pub fn run(
    args: &StoreArgs,
    subpartition: &str,
    start_offset: u64,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.backend != BackendKind::Log {
        return Err(CliError::LogBackendOnly("dump-log").into());
    }
    let log = args.open_log()?;
    let topic = args.partition().topic_name(&LogStoreConfig::default().topic_prefix);
    let records = read_log_records(&*log, &topic, subpartition, start_offset, limit)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        _ => {
            print_text_output(&topic, &records);
        }
    }

    Ok(())
}

fn read_log_records(
    log: &dyn PartitionedLog,
    topic: &str,
    subpartition: &str,
    start_offset: u64,
    limit: Option<usize>,
) -> Result<Vec<LogRecordInfo>, CliError> {
    let Some(count) = log.partition_count(topic)? else {
        return Ok(Vec::new());
    };
    let index = Subpartition::new(subpartition)
        .resolve(count)
        .map_err(CliError::Core)?;
    let tp = TopicPartition::new(topic, index);

    let max_records = limit.unwrap_or(usize::MAX);
    let mut offset = start_offset;
    let mut records = Vec::new();
    while records.len() < max_records {
        let batch = log.fetch(&tp, offset, FETCH_BATCH.min(max_records - records.len()), FETCH_TIMEOUT)?;
        let Some(last) = batch.last() else {
            break;
        };
        offset = last.offset + 1;
        records.extend(batch.into_iter().map(LogRecordInfo::from));
    }
    Ok(records)
}

fn print_text_output(topic: &str, records: &[LogRecordInfo]) {
    println!("Log Records of {topic} ({} total)", records.len());
    println!("================");
    println!();

    for record in records {
        print!("[{:08}] ts={} key={}", record.offset, record.timestamp_ms, record.key);
        match &record.value {
            Some(value) => println!(" value={value}"),
            None => println!(" TOMBSTONE"),
        }
    }
}
