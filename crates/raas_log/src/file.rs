//! File-based partitioned log for persistent storage.
//!
//! Directory layout:
//!
//! ```text
//! <log_dir>/
//! ├─ LOCK                  # Advisory lock for single-owner access
//! └─ <topic>/
//!    ├─ 0.log              # Partition 0
//!    └─ 1.log              # Partition 1
//! ```
//!
//! A partition file starts with a fixed header holding the partition's base
//! offset, followed by checksummed record frames in offset order. The header
//! keeps the next offset known even after retention removed every record.

use crate::error::{LogError, LogResult};
use crate::log::PartitionedLog;
use crate::record::{le_u64, validate_topic_name, LogRecord, TopicPartition};
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const LOCK_FILE: &str = "LOCK";
const PARTITION_EXT: &str = "log";
const PARTITION_TEMP_EXT: &str = "log.tmp";

/// Magic bytes at the start of every partition file.
const PARTITION_MAGIC: [u8; 8] = *b"RLOGPART";

/// Current partition file format version.
const PARTITION_VERSION: u16 = 1;

/// magic (8) + version (2) + base offset (8) = 18 bytes
const PARTITION_HEADER_SIZE: u64 = 18;

/// Configuration for a [`FileLog`].
#[derive(Debug, Clone)]
pub struct FileLogConfig {
    /// Whether to create the log directory if it doesn't exist.
    pub create_if_missing: bool,
    /// Whether to `fsync` the partition file before acknowledging an append.
    pub sync_on_append: bool,
}

impl Default for FileLogConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_append: true,
        }
    }
}

impl FileLogConfig {
    /// Sets whether to create the directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether appends are synced to disk before being acknowledged.
    #[must_use]
    pub const fn sync_on_append(mut self, value: bool) -> Self {
        self.sync_on_append = value;
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    /// Byte position of the frame within the file.
    position: u64,
    timestamp_ms: u64,
}

/// One open partition file plus its in-memory offset index.
///
/// `index[i]` describes the record at offset `base_offset + i`.
#[derive(Debug)]
struct FilePartition {
    path: PathBuf,
    file: File,
    base_offset: u64,
    index: Vec<IndexEntry>,
    size: u64,
}

impl FilePartition {
    fn create(path: &Path, base_offset: u64) -> LogResult<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;
        file.write_all(&partition_header(base_offset))?;
        file.sync_all()?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            base_offset,
            index: Vec::new(),
            size: PARTITION_HEADER_SIZE,
        })
    }

    fn open(path: &Path) -> LogResult<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(false)
            .open(path)?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;

        if (contents.len() as u64) < PARTITION_HEADER_SIZE || contents[0..8] != PARTITION_MAGIC {
            return Err(LogError::corrupted(format!(
                "bad partition header in {}",
                path.display()
            )));
        }
        let version = u16::from_le_bytes([contents[8], contents[9]]);
        if version != PARTITION_VERSION {
            return Err(LogError::corrupted(format!(
                "unsupported partition version {version} in {}",
                path.display()
            )));
        }
        let base_offset = le_u64(&contents[10..18]);

        let mut index = Vec::new();
        let mut position = PARTITION_HEADER_SIZE as usize;
        while position < contents.len() {
            let Some((record, used)) = LogRecord::decode(&contents[position..])? else {
                break;
            };
            let expected = base_offset + index.len() as u64;
            if record.offset != expected {
                return Err(LogError::corrupted(format!(
                    "offset gap in {}: expected {expected}, found {}",
                    path.display(),
                    record.offset
                )));
            }
            index.push(IndexEntry {
                position: position as u64,
                timestamp_ms: record.timestamp_ms,
            });
            position += used;
        }

        let size = position as u64;
        if size < contents.len() as u64 {
            // Torn write from a crash: drop the incomplete frame.
            warn!(
                path = %path.display(),
                discarded = contents.len() as u64 - size,
                "truncating incomplete record at end of partition"
            );
            file.set_len(size)?;
            file.sync_all()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            base_offset,
            index,
            size,
        })
    }

    fn start_offset(&self) -> u64 {
        self.base_offset
    }

    fn end_offset(&self) -> u64 {
        self.base_offset + self.index.len() as u64
    }

    fn append(&mut self, record: &LogRecord, sync: bool) -> LogResult<()> {
        let frame = record.encode()?;
        self.file.seek(SeekFrom::Start(self.size))?;
        self.file.write_all(&frame)?;
        if sync {
            self.file.sync_data()?;
        } else {
            self.file.flush()?;
        }

        self.index.push(IndexEntry {
            position: self.size,
            timestamp_ms: record.timestamp_ms,
        });
        self.size += frame.len() as u64;
        Ok(())
    }

    fn read(&mut self, offset: u64, max_records: usize) -> LogResult<Vec<LogRecord>> {
        let first = offset.saturating_sub(self.base_offset) as usize;
        if first >= self.index.len() || max_records == 0 {
            return Ok(Vec::new());
        }
        let last = first.saturating_add(max_records).min(self.index.len());

        let from = self.index[first].position;
        let to = self.index.get(last).map_or(self.size, |e| e.position);
        let mut buf = vec![0u8; (to - from) as usize];
        self.file.seek(SeekFrom::Start(from))?;
        self.file.read_exact(&mut buf)?;

        let mut records = Vec::with_capacity(last - first);
        let mut cursor = 0;
        while cursor < buf.len() {
            let (record, used) = LogRecord::decode(&buf[cursor..])?.ok_or_else(|| {
                LogError::corrupted(format!("truncated frame in {}", self.path.display()))
            })?;
            records.push(record);
            cursor += used;
        }
        Ok(records)
    }

    fn expire_before(&mut self, cutoff_ms: u64) -> LogResult<u64> {
        let keep_from = self
            .index
            .iter()
            .position(|e| e.timestamp_ms >= cutoff_ms)
            .unwrap_or(self.index.len());
        if keep_from == 0 {
            return Ok(0);
        }

        let new_base = self.base_offset + keep_from as u64;
        let tail_start = self.index.get(keep_from).map_or(self.size, |e| e.position);
        let mut tail = vec![0u8; (self.size - tail_start) as usize];
        self.file.seek(SeekFrom::Start(tail_start))?;
        self.file.read_exact(&mut tail)?;

        // Write the surviving frames to a temp file, then atomically replace.
        let temp_path = self.path.with_extension(PARTITION_TEMP_EXT);
        {
            let mut temp = File::create(&temp_path)?;
            temp.write_all(&partition_header(new_base))?;
            temp.write_all(&tail)?;
            temp.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;
        self.file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)?;

        let shift = tail_start - PARTITION_HEADER_SIZE;
        self.index = self.index[keep_from..]
            .iter()
            .map(|e| IndexEntry {
                position: e.position - shift,
                timestamp_ms: e.timestamp_ms,
            })
            .collect();
        self.base_offset = new_base;
        self.size = PARTITION_HEADER_SIZE + tail.len() as u64;

        Ok(keep_from as u64)
    }
}

fn partition_header(base_offset: u64) -> Vec<u8> {
    let mut header = Vec::with_capacity(PARTITION_HEADER_SIZE as usize);
    header.extend_from_slice(&PARTITION_MAGIC);
    header.extend_from_slice(&PARTITION_VERSION.to_le_bytes());
    header.extend_from_slice(&base_offset.to_le_bytes());
    header
}

/// A file-based partitioned log.
///
/// Records survive process restarts. Each topic is a directory and each
/// partition a single append-only file.
///
/// # Durability
///
/// With [`FileLogConfig::sync_on_append`] (the default) every append is
/// `fsync`ed before it is acknowledged.
///
/// # Thread Safety
///
/// Each partition has its own lock. The whole directory is protected by an
/// exclusive advisory lock so only one process can own it at a time.
///
/// # Example
///
/// ```no_run
/// use raas_log::{FileLog, PartitionedLog, TopicPartition};
/// use std::path::Path;
/// use std::time::Duration;
///
/// let log = FileLog::open(Path::new("alarm-log")).unwrap();
/// log.create_topic("alarms", 1).unwrap();
/// let tp = TopicPartition::new("alarms", 0);
/// log.append(&tp, "kota", Some(b"{}"), 0, Duration::from_secs(5)).unwrap();
/// ```
#[derive(Debug)]
pub struct FileLog {
    dir: PathBuf,
    config: FileLogConfig,
    topics: RwLock<HashMap<String, Vec<Arc<Mutex<FilePartition>>>>>,
    /// Lock file handle (held for exclusive access).
    _lock_file: File,
}

impl FileLog {
    /// Opens or creates a log in `dir` with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or locked, or an
    /// existing partition file is corrupted.
    pub fn open(dir: &Path) -> LogResult<Self> {
        Self::open_with_config(dir, FileLogConfig::default())
    }

    /// Opens or creates a log in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - Another process holds the lock (returns [`LogError::Locked`])
    /// - A partition file is corrupted
    pub fn open_with_config(dir: &Path, config: FileLogConfig) -> LogResult<Self> {
        if !dir.exists() {
            if config.create_if_missing {
                fs::create_dir_all(dir)?;
            } else {
                return Err(LogError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("log directory does not exist: {}", dir.display()),
                )));
            }
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(LogError::Locked(dir.to_path_buf()));
        }

        let mut topics = HashMap::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if validate_topic_name(&name).is_err() {
                warn!(dir = %entry.path().display(), "ignoring non-topic directory");
                continue;
            }
            let partitions = open_topic_dir(&entry.path())?;
            debug!(topic = %name, partitions = partitions.len(), "opened topic");
            topics.insert(name, partitions);
        }
        info!(dir = %dir.display(), topics = topics.len(), "file log opened");

        Ok(Self {
            dir: dir.to_path_buf(),
            config,
            topics: RwLock::new(topics),
            _lock_file: lock_file,
        })
    }

    /// Returns the log directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn partition(&self, tp: &TopicPartition) -> LogResult<Arc<Mutex<FilePartition>>> {
        self.topics
            .read()
            .get(&tp.topic)
            .and_then(|partitions| partitions.get(tp.partition as usize))
            .cloned()
            .ok_or_else(|| LogError::UnknownPartition(tp.clone()))
    }
}

/// Opens the partitions of one topic directory. Partition files must be
/// numbered densely from zero.
fn open_topic_dir(topic_dir: &Path) -> LogResult<Vec<Arc<Mutex<FilePartition>>>> {
    let mut numbered = Vec::new();
    for entry in fs::read_dir(topic_dir)? {
        let path = entry?.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if file_name.ends_with(PARTITION_TEMP_EXT) {
            // Leftover of an interrupted retention rewrite.
            fs::remove_file(&path)?;
            continue;
        }
        let Some(stem) = file_name.strip_suffix(".log") else {
            continue;
        };
        let index: u32 = stem.parse().map_err(|_| {
            LogError::corrupted(format!("unexpected partition file {}", path.display()))
        })?;
        numbered.push((index, path));
    }
    numbered.sort_by_key(|(index, _)| *index);

    let mut partitions = Vec::with_capacity(numbered.len());
    for (expected, (index, path)) in numbered.into_iter().enumerate() {
        if index as usize != expected {
            return Err(LogError::corrupted(format!(
                "missing partition {expected} in {}",
                topic_dir.display()
            )));
        }
        partitions.push(Arc::new(Mutex::new(FilePartition::open(&path)?)));
    }
    if partitions.is_empty() {
        return Err(LogError::corrupted(format!(
            "topic directory without partitions: {}",
            topic_dir.display()
        )));
    }
    Ok(partitions)
}

impl PartitionedLog for FileLog {
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

        let topic_dir = self.dir.join(topic);
        fs::create_dir_all(&topic_dir)?;
        let mut created = Vec::with_capacity(partitions as usize);
        for index in 0..partitions {
            let path = topic_dir.join(format!("{index}.{PARTITION_EXT}"));
            created.push(Arc::new(Mutex::new(FilePartition::create(&path, 0)?)));
        }
        info!(topic, partitions, "created topic");
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

        let record = LogRecord {
            offset: data.end_offset(),
            timestamp_ms,
            key: key.to_string(),
            value: value.map(<[u8]>::to_vec),
        };
        data.append(&record, self.config.sync_on_append)?;
        Ok(record.offset)
    }

    fn fetch(
        &self,
        tp: &TopicPartition,
        offset: u64,
        max_records: usize,
        timeout: Duration,
    ) -> LogResult<Vec<LogRecord>> {
        let partition = self.partition(tp)?;
        let Some(mut data) = partition.try_lock_for(timeout) else {
            return Ok(Vec::new());
        };
        data.read(offset, max_records)
    }

    fn start_offset(&self, tp: &TopicPartition) -> LogResult<u64> {
        Ok(self.partition(tp)?.lock().start_offset())
    }

    fn end_offset(&self, tp: &TopicPartition) -> LogResult<u64> {
        Ok(self.partition(tp)?.lock().end_offset())
    }

    fn expire_before(&self, tp: &TopicPartition, cutoff_ms: u64) -> LogResult<u64> {
        let partition = self.partition(tp)?;
        let removed = partition.lock().expire_before(cutoff_ms)?;
        if removed > 0 {
            debug!(partition = %tp, removed, "expired records");
        }
        Ok(removed)
    }
}
