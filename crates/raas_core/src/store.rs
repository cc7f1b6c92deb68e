//! Backend-agnostic store contract and the façade that dispatches to a
//! configured backend.

use crate::config::{BackendKind, StoreConfig};
use crate::error::{CoreError, CoreResult};
use crate::log_store::LogStore;
use crate::reference::ReferenceStore;
use crate::types::{AlarmValue, Cursor, NotificationId, Pack, PartitionKey, Subpartition};
use raas_log::PartitionedLog;
use std::sync::Arc;
use tracing::info_span;

/// The storage contract every backend fulfils.
///
/// Backends are safe to share between threads; concurrent calls on one
/// backend never corrupt it.
pub trait AlarmStore: Send + Sync {
    /// Short backend name for diagnostics.
    fn backend_name(&self) -> &'static str;

    /// Creates, updates or (with `None`) deletes an alarm.
    ///
    /// A successful return means the write is durable in the backend and
    /// visible to every later [`AlarmStore::get_pack`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownSubpartition`] for a subpartition outside
    /// the partition, or [`CoreError::WriteAcknowledgement`] if the backend
    /// did not confirm the write.
    fn put(
        &self,
        partition: &PartitionKey,
        subpartition: &Subpartition,
        notification_id: &NotificationId,
        value: Option<&AlarmValue>,
    ) -> CoreResult<()>;

    /// Deletes an alarm. Same as `put` with no value.
    ///
    /// # Errors
    ///
    /// See [`AlarmStore::put`].
    fn delete(
        &self,
        partition: &PartitionKey,
        subpartition: &Subpartition,
        notification_id: &NotificationId,
    ) -> CoreResult<()> {
        self.put(partition, subpartition, notification_id, None)
    }

    /// Returns up to `limit` entries starting at `cursor` (or at the
    /// beginning), plus the cursor for the following pack.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCursor`] for a cursor the backend could not
    /// have issued, [`CoreError::UnknownSubpartition`] for a subpartition
    /// outside the partition, or a backend read error.
    fn get_pack(
        &self,
        partition: &PartitionKey,
        subpartition: &Subpartition,
        cursor: Option<&Cursor>,
        limit: usize,
    ) -> CoreResult<Pack>;

    /// Lists the partition's subpartitions in index order.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the partition's metadata cannot be read.
    fn list_subpartitions(&self, partition: &PartitionKey) -> CoreResult<Vec<Subpartition>>;

    /// Drops data older than the backend's retention, relative to `now_ms`.
    /// Returns the number of records removed.
    ///
    /// Backends that keep no history have nothing to drop.
    ///
    /// # Errors
    ///
    /// Returns a backend error if expiry fails.
    fn enforce_retention(&self, _now_ms: u64) -> CoreResult<u64> {
        Ok(0)
    }
}

/// Single entry point for callers, dispatching to the configured backend.
pub struct Store {
    backend: Box<dyn AlarmStore>,
}

impl Store {
    /// Opens a store on the backend selected by `config`.
    ///
    /// The log backend requires `log`; the reference backend ignores it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the configuration is invalid or the
    /// log backend is selected without a log.
    pub fn open(config: &StoreConfig, log: Option<Arc<dyn PartitionedLog>>) -> CoreResult<Self> {
        match (config.backend, log) {
            (BackendKind::Reference, _) => Ok(Self::reference(config)),
            (BackendKind::Log, Some(log)) => Self::log(log, config),
            (BackendKind::Log, None) => Err(CoreError::config("log backend requires a log")),
        }
    }

    /// Creates a store on a fresh in-memory reference backend.
    #[must_use]
    pub fn reference(config: &StoreConfig) -> Self {
        Self::with_backend(Box::new(ReferenceStore::new(config.layout)))
    }

    /// Creates a store on a log backend.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the log settings are invalid.
    pub fn log(log: Arc<dyn PartitionedLog>, config: &StoreConfig) -> CoreResult<Self> {
        let store = LogStore::new(log, config.layout, config.log.clone())?;
        Ok(Self::with_backend(Box::new(store)))
    }

    /// Wraps an existing backend.
    pub fn with_backend(backend: Box<dyn AlarmStore>) -> Self {
        Self { backend }
    }
}

impl AlarmStore for Store {
    fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    fn put(
        &self,
        partition: &PartitionKey,
        subpartition: &Subpartition,
        notification_id: &NotificationId,
        value: Option<&AlarmValue>,
    ) -> CoreResult<()> {
        let _span = info_span!(
            "put",
            backend = self.backend.backend_name(),
            %partition,
            %subpartition,
            %notification_id,
            delete = value.is_none()
        )
        .entered();
        self.backend.put(partition, subpartition, notification_id, value)
    }

    fn get_pack(
        &self,
        partition: &PartitionKey,
        subpartition: &Subpartition,
        cursor: Option<&Cursor>,
        limit: usize,
    ) -> CoreResult<Pack> {
        let _span = info_span!(
            "get_pack",
            backend = self.backend.backend_name(),
            %partition,
            %subpartition,
            cursor = cursor.map(Cursor::as_str),
            limit
        )
        .entered();
        self.backend.get_pack(partition, subpartition, cursor, limit)
    }

    fn list_subpartitions(&self, partition: &PartitionKey) -> CoreResult<Vec<Subpartition>> {
        let _span = info_span!(
            "list_subpartitions",
            backend = self.backend.backend_name(),
            %partition
        )
        .entered();
        self.backend.list_subpartitions(partition)
    }

    fn enforce_retention(&self, now_ms: u64) -> CoreResult<u64> {
        let _span = info_span!("enforce_retention", backend = self.backend.backend_name()).entered();
        self.backend.enforce_retention(now_ms)
    }
}
