//! Test fixtures and store helpers.
//!
//! Provides stores on every backend with automatic cleanup, plus the alarm
//! data the scenarios write.

use raas_core::{
    AlarmStore, AlarmValue, LogStore, LogStoreConfig, PartitionKey, ReferenceStore, Store,
    Subpartition, SubpartitionLayout,
};
use raas_log::{FileLog, InMemoryLog, PartitionedLog};
use std::fmt;
use std::sync::Arc;
use tempfile::TempDir;

/// An alarm with its scope.
#[derive(Debug, Clone, Copy)]
pub struct AlarmDetails {
    /// Partition domain.
    pub domain: &'static str,
    /// Partition adapter name.
    pub adapter_name: &'static str,
    /// Notification identifier.
    pub notification_id: &'static str,
    /// JSON value.
    pub json: &'static str,
}

impl AlarmDetails {
    /// Returns the alarm's partition.
    pub fn partition(&self) -> PartitionKey {
        PartitionKey::new(self.domain, self.adapter_name)
    }

    /// Returns the alarm's value.
    pub fn value(&self) -> AlarmValue {
        AlarmValue::new(self.json)
    }
}

/// The alarm most scenarios start from.
pub const EXISTING_ALARM: AlarmDetails = AlarmDetails {
    domain: "ala",
    adapter_name: "ma",
    notification_id: "kota",
    json: "{\"moIdentifier\":\"kot\"}",
};

/// Identifiers written in order by the ordering scenarios.
pub const TEST_KEYS: [&str; 3] = ["eric2g:33", "siem:44", "huawei:11"];

/// Returns the default subpartition.
pub fn default_subpartition() -> Subpartition {
    Subpartition::new("0")
}

/// Backends a [`TestStore`] can run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestBackend {
    /// [`ReferenceStore`].
    Reference,
    /// [`LogStore`] over [`InMemoryLog`].
    MemoryLog,
    /// [`LogStore`] over [`FileLog`] in a temporary directory.
    FileLog,
}

impl TestBackend {
    /// Every backend.
    pub const ALL: [TestBackend; 3] = [Self::Reference, Self::MemoryLog, Self::FileLog];

    /// Backends built on a log.
    pub const LOGS: [TestBackend; 2] = [Self::MemoryLog, Self::FileLog];
}

impl fmt::Display for TestBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reference => "reference",
            Self::MemoryLog => "memory-log",
            Self::FileLog => "file-log",
        })
    }
}

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: Store,
    backend: TestBackend,
    layout: SubpartitionLayout,
    log: Option<Arc<dyn PartitionedLog>>,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a store on `backend` with one subpartition.
    pub fn new(backend: TestBackend) -> Self {
        Self::with_layout(backend, SubpartitionLayout::default())
    }

    /// Creates a store on `backend` with `layout`.
    pub fn with_layout(backend: TestBackend, layout: SubpartitionLayout) -> Self {
        match backend {
            TestBackend::Reference => Self {
                store: Store::with_backend(Box::new(ReferenceStore::new(layout))),
                backend,
                layout,
                log: None,
                temp_dir: None,
            },
            TestBackend::MemoryLog => Self::on_log(backend, layout, Arc::new(InMemoryLog::new()), None),
            TestBackend::FileLog => {
                let temp_dir = TempDir::new().expect("Failed to create temp directory");
                let log = FileLog::open(temp_dir.path()).expect("Failed to open file log");
                Self::on_log(backend, layout, Arc::new(log), Some(temp_dir))
            }
        }
    }

    fn on_log(
        backend: TestBackend,
        layout: SubpartitionLayout,
        log: Arc<dyn PartitionedLog>,
        temp_dir: Option<TempDir>,
    ) -> Self {
        let store = LogStore::new(Arc::clone(&log), layout, LogStoreConfig::default())
            .expect("Failed to create log store");
        Self {
            store: Store::with_backend(Box::new(store)),
            backend,
            layout,
            log: Some(log),
            temp_dir,
        }
    }

    /// Returns the backend.
    pub fn backend(&self) -> TestBackend {
        self.backend
    }

    /// Returns the underlying log, if the backend has one.
    pub fn log(&self) -> Option<&Arc<dyn PartitionedLog>> {
        self.log.as_ref()
    }

    /// Simulates a process restart.
    ///
    /// Log backends get a new store (and a new consumer identity) over the
    /// same data; a file log is closed and reopened from disk. The reference
    /// backend keeps its state in memory only, so it comes back empty.
    pub fn restart(self) -> Self {
        let Self {
            store,
            backend,
            layout,
            log,
            temp_dir,
        } = self;
        drop(store);

        match backend {
            TestBackend::Reference => Self::with_layout(backend, layout),
            TestBackend::MemoryLog => {
                let log = log.expect("Memory log backend without a log");
                Self::on_log(backend, layout, log, None)
            }
            TestBackend::FileLog => {
                drop(log);
                let temp_dir = temp_dir.expect("File log backend without a directory");
                let log = FileLog::open(temp_dir.path()).expect("Failed to reopen file log");
                Self::on_log(backend, layout, Arc::new(log), Some(temp_dir))
            }
        }
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs `f` against a fresh store on every backend.
///
/// # Example
///
/// ```rust,ignore
/// use raas_testkit::with_each_backend;
///
/// #[test]
/// fn my_test() {
///     with_each_backend(|store| {
///         // ... store operations
///     });
/// }
/// ```
pub fn with_each_backend<F>(mut f: F)
where
    F: FnMut(&TestStore),
{
    for backend in TestBackend::ALL {
        f(&TestStore::new(backend));
    }
}

/// Writes `EXISTING_ALARM`'s value under each id, in order.
pub fn put_all(store: &dyn AlarmStore, ids: &[&str]) {
    for id in ids {
        store
            .put(
                &EXISTING_ALARM.partition(),
                &default_subpartition(),
                &(*id).into(),
                Some(&EXISTING_ALARM.value()),
            )
            .expect("Failed to put alarm");
    }
}

/// Deletes each id, in order.
pub fn delete_all(store: &dyn AlarmStore, ids: &[&str]) {
    for id in ids {
        store
            .delete(&EXISTING_ALARM.partition(), &default_subpartition(), &(*id).into())
            .expect("Failed to delete alarm");
    }
}
