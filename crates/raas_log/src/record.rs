//! Log record types and their on-disk framing.

use crate::error::{LogError, LogResult};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Magic bytes identifying a record frame.
pub(crate) const FRAME_MAGIC: [u8; 4] = *b"RLOG";

/// Current frame format version.
pub(crate) const FRAME_VERSION: u16 = 1;

/// Frame header size:
/// magic (4) + version (2) + flags (1) + offset (8) + timestamp (8) + key len (4) + value len (4)
pub(crate) const FRAME_HEADER_SIZE: usize = 31;

/// CRC size.
pub(crate) const CRC_SIZE: usize = 4;

/// Flag bit set on tombstone frames.
const FLAG_TOMBSTONE: u8 = 0x01;

/// Maximum length of a topic name.
const MAX_TOPIC_LEN: usize = 249;

/// Address of one partition of a topic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TopicPartition {
    /// Topic name.
    pub topic: String,
    /// Partition index within the topic.
    pub partition: u32,
}

impl TopicPartition {
    /// Creates a new topic partition address.
    pub fn new(topic: impl Into<String>, partition: u32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.topic, self.partition)
    }
}

/// A keyed record stored in a log partition.
///
/// A record without a value is a tombstone: it marks its key as deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Offset of the record within its partition.
    pub offset: u64,
    /// Append time in milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// Record key.
    pub key: String,
    /// Record payload, `None` for a tombstone.
    pub value: Option<Vec<u8>>,
}

impl LogRecord {
    /// Returns true if this record is a tombstone.
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    /// Encodes the record as a checksummed frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the key or the value is longer than `u32::MAX` bytes.
    pub fn encode(&self) -> LogResult<Vec<u8>> {
        let key = self.key.as_bytes();
        let value = self.value.as_deref().unwrap_or_default();

        let key_len = u32::try_from(key.len())
            .map_err(|_| LogError::corrupted("record key too large"))?;
        let value_len = u32::try_from(value.len())
            .map_err(|_| LogError::corrupted("record value too large"))?;

        let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + key.len() + value.len() + CRC_SIZE);
        buf.extend_from_slice(&FRAME_MAGIC);
        buf.extend_from_slice(&FRAME_VERSION.to_le_bytes());
        buf.push(if self.is_tombstone() { FLAG_TOMBSTONE } else { 0 });
        buf.extend_from_slice(&self.offset.to_le_bytes());
        buf.extend_from_slice(&self.timestamp_ms.to_le_bytes());
        buf.extend_from_slice(&key_len.to_le_bytes());
        buf.extend_from_slice(&value_len.to_le_bytes());
        buf.extend_from_slice(key);
        buf.extend_from_slice(value);

        let crc = compute_crc32(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        Ok(buf)
    }

    /// Decodes one frame from the start of `buf`.
    ///
    /// Returns the record and the number of bytes it occupied, or `None`
    /// when `buf` ends before the frame is complete (a torn tail).
    ///
    /// # Errors
    ///
    /// Returns an error on bad magic, unknown version, checksum mismatch or
    /// a key that is not UTF-8.
    pub fn decode(buf: &[u8]) -> LogResult<Option<(Self, usize)>> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }
        if buf[0..4] != FRAME_MAGIC {
            return Err(LogError::corrupted("bad frame magic"));
        }
        let version = u16::from_le_bytes([buf[4], buf[5]]);
        if version != FRAME_VERSION {
            return Err(LogError::corrupted(format!(
                "unsupported frame version {version}"
            )));
        }

        let flags = buf[6];
        let offset = le_u64(&buf[7..15]);
        let timestamp_ms = le_u64(&buf[15..23]);
        let key_len = le_u32(&buf[23..27]) as usize;
        let value_len = le_u32(&buf[27..31]) as usize;

        let body_end = FRAME_HEADER_SIZE + key_len + value_len;
        let total = body_end + CRC_SIZE;
        if buf.len() < total {
            return Ok(None);
        }

        let expected = le_u32(&buf[body_end..total]);
        let actual = compute_crc32(&buf[..body_end]);
        if expected != actual {
            return Err(LogError::corrupted(format!(
                "checksum mismatch at offset {offset}: expected {expected:08x}, got {actual:08x}"
            )));
        }

        let key_end = FRAME_HEADER_SIZE + key_len;
        let key = String::from_utf8(buf[FRAME_HEADER_SIZE..key_end].to_vec())
            .map_err(|_| LogError::corrupted(format!("non UTF-8 key at offset {offset}")))?;

        let value = if flags & FLAG_TOMBSTONE != 0 {
            if value_len != 0 {
                return Err(LogError::corrupted(format!(
                    "tombstone with payload at offset {offset}"
                )));
            }
            None
        } else {
            Some(buf[key_end..body_end].to_vec())
        };

        Ok(Some((
            Self {
                offset,
                timestamp_ms,
                key,
                value,
            },
            total,
        )))
    }
}

pub(crate) fn le_u64(bytes: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(raw)
}

pub(crate) fn le_u32(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(raw)
}

/// Checks that `name` can be used as a topic name.
///
/// Topic names are 1 to 249 characters from `[A-Za-z0-9._-]` and are not
/// `.` or `..`, so they are safe to use as directory names.
///
/// # Errors
///
/// Returns [`LogError::InvalidTopic`] if the name is not usable.
pub fn validate_topic_name(name: &str) -> LogResult<()> {
    if name.is_empty() || name.len() > MAX_TOPIC_LEN {
        return Err(LogError::InvalidTopic(format!(
            "topic name must be 1..={MAX_TOPIC_LEN} characters: {name:?}"
        )));
    }
    if name == "." || name == ".." {
        return Err(LogError::InvalidTopic(format!("reserved topic name {name:?}")));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(LogError::InvalidTopic(format!(
            "illegal character {c:?} in topic name {name:?}"
        )));
    }
    Ok(())
}

/// Returns the current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Computes a CRC32 checksum (IEEE polynomial).
#[must_use]
pub fn compute_crc32(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    !crc
}
