//! Core type definitions for the alarm store.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

/// Identity of an alarm source: a domain plus an adapter name.
///
/// Partitions never share state with each other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionKey {
    domain: String,
    adapter_name: String,
}

impl PartitionKey {
    /// Creates a partition key.
    pub fn new(domain: impl Into<String>, adapter_name: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            adapter_name: adapter_name.into(),
        }
    }

    /// Returns the domain.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the adapter name.
    #[must_use]
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Returns the log topic holding this partition: `<prefix>.<domain>.<adapter>`.
    ///
    /// Domain and adapter are escaped so distinct keys never map to the same
    /// topic.
    #[must_use]
    pub fn topic_name(&self, prefix: &str) -> String {
        let mut topic = String::with_capacity(
            prefix.len() + self.domain.len() + self.adapter_name.len() + 2,
        );
        topic.push_str(prefix);
        topic.push('.');
        escape_into(&mut topic, &self.domain);
        topic.push('.');
        escape_into(&mut topic, &self.adapter_name);
        topic
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.adapter_name)
    }
}

fn escape_into(out: &mut String, component: &str) {
    for byte in component.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(char::from(byte));
        } else {
            // Writing to a String cannot fail.
            let _ = write!(out, "_{byte:02X}");
        }
    }
}

/// Name of a subpartition inside a partition.
///
/// Valid names are the decimal indexes `"0"` through `"n-1"` of the
/// partition's [`SubpartitionLayout`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subpartition(String);

impl Subpartition {
    /// Creates a subpartition name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates the subpartition with the given index.
    #[must_use]
    pub fn from_index(index: u32) -> Self {
        Self(index.to_string())
    }

    /// Returns the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the canonical decimal index of this name.
    ///
    /// Returns `None` for anything but a canonical index (`"01"` and `"+1"`
    /// are not the name of subpartition 1).
    #[must_use]
    pub fn index(&self) -> Option<u32> {
        let index: u32 = self.0.parse().ok()?;
        (index.to_string() == self.0).then_some(index)
    }

    /// Resolves this name against a partition with `count` subpartitions.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownSubpartition`] if the name is not one of
    /// the partition's subpartitions.
    pub fn resolve(&self, count: u32) -> CoreResult<u32> {
        match self.index() {
            Some(index) if index < count => Ok(index),
            _ => Err(CoreError::UnknownSubpartition {
                subpartition: self.0.clone(),
                available: count,
            }),
        }
    }
}

impl fmt::Display for Subpartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Subpartition {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Fixed set of subpartitions every partition is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubpartitionLayout {
    count: u32,
}

impl SubpartitionLayout {
    /// Creates a layout with `count` subpartitions.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if `count` is zero.
    pub fn new(count: u32) -> CoreResult<Self> {
        if count == 0 {
            return Err(CoreError::config("subpartition count must be at least 1"));
        }
        Ok(Self { count })
    }

    /// Returns the number of subpartitions.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Returns the subpartition names in index order.
    #[must_use]
    pub fn names(&self) -> Vec<Subpartition> {
        (0..self.count).map(Subpartition::from_index).collect()
    }

    /// Resolves a subpartition name against this layout.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownSubpartition`] for names outside the layout.
    pub fn resolve(&self, subpartition: &Subpartition) -> CoreResult<u32> {
        subpartition.resolve(self.count)
    }
}

impl Default for SubpartitionLayout {
    fn default() -> Self {
        Self { count: 1 }
    }
}

/// Unique identifier of an alarm within a (partition, subpartition) scope.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    /// Creates a notification identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NotificationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NotificationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque alarm value, usually a JSON object serialized as text.
///
/// The store never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmValue(String);

impl AlarmValue {
    /// Creates a value from text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Creates a value from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ValueFormat`] if the bytes are not UTF-8.
    pub fn from_bytes(bytes: Vec<u8>) -> CoreResult<Self> {
        String::from_utf8(bytes)
            .map(Self)
            .map_err(|e| CoreError::value_format(format!("value is not UTF-8: {e}")))
    }

    /// Returns the value text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the value as bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Consumes the value, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AlarmValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One stored alarm: identifier, value (`None` for a tombstone) and the
/// backend-assigned position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmEntry {
    /// The alarm identifier.
    pub notification_id: NotificationId,
    /// The alarm value, `None` for a tombstone.
    pub value: Option<AlarmValue>,
    /// Backend-assigned ordering key.
    pub position: u64,
}

/// Opaque resume token issued by a backend.
///
/// Only meaningful for the backend, partition and subpartition that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Creates a cursor from its text form.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Creates a cursor naming a log offset.
    #[must_use]
    pub fn from_offset(offset: u64) -> Self {
        Self(offset.to_string())
    }

    /// Returns the text form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the log offset this cursor names.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCursor`] if the cursor is not a decimal offset.
    pub fn offset(&self) -> CoreResult<u64> {
        self.0
            .parse()
            .map_err(|_| CoreError::invalid_cursor(self.0.clone()))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a traversal.
///
/// Identifiers and values are index-aligned; a `None` value is a tombstone.
/// `next_cursor` is `None` exactly when nothing more is available at the time
/// the pack was produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pack {
    #[serde(rename = "alarmNotificationIdentifiers")]
    notification_ids: Vec<NotificationId>,
    #[serde(rename = "alarmValues")]
    values: Vec<Option<AlarmValue>>,
    #[serde(rename = "tagOfTheNextAvailableAlarm")]
    next_cursor: Option<Cursor>,
}

impl Pack {
    /// Creates an empty, final pack.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a pack from entries in order.
    pub fn from_entries<I>(entries: I, next_cursor: Option<Cursor>) -> Self
    where
        I: IntoIterator<Item = (NotificationId, Option<AlarmValue>)>,
    {
        let (notification_ids, values) = entries.into_iter().unzip();
        Self {
            notification_ids,
            values,
            next_cursor,
        }
    }

    /// Returns the identifiers in pack order.
    #[must_use]
    pub fn notification_ids(&self) -> &[NotificationId] {
        &self.notification_ids
    }

    /// Returns the values, aligned with [`Pack::notification_ids`].
    #[must_use]
    pub fn values(&self) -> &[Option<AlarmValue>] {
        &self.values
    }

    /// Returns the cursor for the next pack, `None` if this is the last one.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&Cursor> {
        self.next_cursor.as_ref()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notification_ids.len()
    }

    /// Returns true if the pack has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notification_ids.is_empty()
    }

    /// Iterates over `(identifier, value)` pairs in pack order.
    pub fn iter(&self) -> impl Iterator<Item = (&NotificationId, Option<&AlarmValue>)> {
        self.notification_ids
            .iter()
            .zip(self.values.iter().map(Option::as_ref))
    }

    /// Consumes the pack, returning its entries and next cursor.
    #[must_use]
    pub fn into_parts(self) -> (Vec<(NotificationId, Option<AlarmValue>)>, Option<Cursor>) {
        let entries = self.notification_ids.into_iter().zip(self.values).collect();
        (entries, self.next_cursor)
    }
}
