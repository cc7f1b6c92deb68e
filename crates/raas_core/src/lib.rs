//! # RAAS Core
//!
//! Store contract and backends for the raw active alarms store.
//!
//! This crate provides:
//! - The alarm data model (partition keys, subpartitions, values, packs, cursors)
//! - [`AlarmStore`], the backend-agnostic contract, and the [`Store`] façade
//! - [`ReferenceStore`], a deterministic in-memory backend
//! - [`LogStore`], a durable backend over an append-only [`raas_log::PartitionedLog`]
//! - [`ValueCodec`], an opt-in JSON attribute merge helper
//!
//! # Consistency contract
//!
//! Calling [`AlarmStore::get_pack`] with no cursor, then feeding back every
//! returned next cursor until it is `None`, reconstructs the complete set of
//! currently active alarms, as long as the whole traversal finishes within
//! [`STALENESS_WINDOW`]. Applying a pack means: an entry with a value is an
//! active alarm, an entry without a value removes that alarm.
//!
//! ```rust
//! use raas_core::{AlarmStore, AlarmValue, PartitionKey, ReferenceStore, Subpartition, SubpartitionLayout};
//!
//! let store = ReferenceStore::new(SubpartitionLayout::default());
//! let partition = PartitionKey::new("ala", "ma");
//! let sub = Subpartition::new("0");
//!
//! store.put(&partition, &sub, &"kota".into(), Some(&AlarmValue::new("{\"moIdentifier\":\"kot\"}"))).unwrap();
//! let pack = store.get_pack(&partition, &sub, None, 100).unwrap();
//! assert_eq!(pack.len(), 1);
//! assert!(pack.next_cursor().is_none());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used)]

mod codec;
mod config;
mod error;
mod log_store;
mod reference;
mod store;
mod types;

pub use codec::ValueCodec;
pub use config::{BackendKind, LogStoreConfig, StoreConfig, STALENESS_WINDOW};
pub use error::{CoreError, CoreResult};
pub use log_store::LogStore;
pub use reference::ReferenceStore;
pub use store::{AlarmStore, Store};
pub use types::{
    AlarmEntry, AlarmValue, Cursor, NotificationId, Pack, PartitionKey, Subpartition,
    SubpartitionLayout,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
