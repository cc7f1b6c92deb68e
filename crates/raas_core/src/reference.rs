//! In-memory reference backend.

use crate::error::CoreResult;
use crate::store::AlarmStore;
use crate::types::{
    AlarmEntry, AlarmValue, Cursor, NotificationId, Pack, PartitionKey, Subpartition,
    SubpartitionLayout,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

#[derive(Debug, Default)]
struct ScopeEntries {
    by_id: HashMap<NotificationId, AlarmEntry>,
    by_position: BTreeMap<u64, NotificationId>,
}

impl ScopeEntries {
    fn upsert(&mut self, id: &NotificationId, value: AlarmValue, position: u64) {
        let entry = AlarmEntry {
            notification_id: id.clone(),
            value: Some(value),
            position,
        };
        if let Some(previous) = self.by_id.insert(id.clone(), entry) {
            self.by_position.remove(&previous.position);
        }
        self.by_position.insert(position, id.clone());
    }

    fn remove(&mut self, id: &NotificationId) {
        if let Some(previous) = self.by_id.remove(id) {
            self.by_position.remove(&previous.position);
        }
    }
}

#[derive(Debug, Default)]
struct ReferenceState {
    next_position: u64,
    scopes: HashMap<(PartitionKey, Subpartition), ScopeEntries>,
}

/// Deterministic in-memory backend.
///
/// Every write takes the next value of a store-wide counter as its position,
/// so an updated alarm moves behind all alarms written before the update.
/// Deletes remove the entry outright; packs never contain tombstones. A
/// cursor is the identifier of the first entry of the next pack.
///
/// State lives only as long as the store.
#[derive(Debug)]
pub struct ReferenceStore {
    layout: SubpartitionLayout,
    state: Mutex<ReferenceState>,
}

impl ReferenceStore {
    /// Creates an empty store where every partition has `layout`'s subpartitions.
    #[must_use]
    pub fn new(layout: SubpartitionLayout) -> Self {
        Self {
            layout,
            state: Mutex::new(ReferenceState::default()),
        }
    }

    /// Returns the number of live alarms across all partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().scopes.values().map(|s| s.by_id.len()).sum()
    }

    /// Returns true if no alarm is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ReferenceStore {
    fn default() -> Self {
        Self::new(SubpartitionLayout::default())
    }
}

impl AlarmStore for ReferenceStore {
    fn backend_name(&self) -> &'static str {
        "reference"
    }

    fn put(
        &self,
        partition: &PartitionKey,
        subpartition: &Subpartition,
        notification_id: &NotificationId,
        value: Option<&AlarmValue>,
    ) -> CoreResult<()> {
        self.layout.resolve(subpartition)?;
        let scope_key = (partition.clone(), subpartition.clone());

        let mut state = self.state.lock();
        match value {
            Some(value) => {
                let position = state.next_position;
                state.next_position += 1;
                state
                    .scopes
                    .entry(scope_key)
                    .or_default()
                    .upsert(notification_id, value.clone(), position);
            }
            None => {
                if let Some(scope) = state.scopes.get_mut(&scope_key) {
                    scope.remove(notification_id);
                    if scope.by_id.is_empty() {
                        state.scopes.remove(&scope_key);
                    }
                }
            }
        }
        Ok(())
    }

    fn get_pack(
        &self,
        partition: &PartitionKey,
        subpartition: &Subpartition,
        cursor: Option<&Cursor>,
        limit: usize,
    ) -> CoreResult<Pack> {
        self.layout.resolve(subpartition)?;

        let state = self.state.lock();
        let Some(scope) = state.scopes.get(&(partition.clone(), subpartition.clone())) else {
            return Ok(Pack::empty());
        };

        let start = match cursor {
            None => 0,
            Some(cursor) => match scope.by_id.get(&NotificationId::new(cursor.as_str())) {
                Some(entry) => entry.position,
                None => {
                    // The entry was deleted or moved since the cursor was issued.
                    debug!(%partition, %subpartition, %cursor, "cursor names no live entry");
                    return Ok(Pack::empty());
                }
            },
        };

        let mut positions = scope.by_position.range(start..);
        let entries: Vec<_> = positions
            .by_ref()
            .take(limit)
            .filter_map(|(_, id)| scope.by_id.get(id))
            .map(|entry| (entry.notification_id.clone(), entry.value.clone()))
            .collect();
        let next_cursor = positions
            .next()
            .map(|(_, id)| Cursor::new(id.as_str()));

        Ok(Pack::from_entries(entries, next_cursor))
    }

    fn list_subpartitions(&self, _partition: &PartitionKey) -> CoreResult<Vec<Subpartition>> {
        Ok(self.layout.names())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn key() -> PartitionKey {
        PartitionKey::new("ala", "ma")
    }

    fn sub() -> Subpartition {
        Subpartition::new("0")
    }

    fn put(store: &ReferenceStore, id: &str, value: &str) {
        store
            .put(&key(), &sub(), &id.into(), Some(&AlarmValue::new(value)))
            .unwrap();
    }

    fn ids(pack: &Pack) -> Vec<&str> {
        pack.notification_ids().iter().map(NotificationId::as_str).collect()
    }

    #[test]
    fn pages_in_write_order() {
        let store = ReferenceStore::default();
        for id in ["a", "b", "c"] {
            put(&store, id, "{}");
        }

        let first = store.get_pack(&key(), &sub(), None, 2).unwrap();
        assert_eq!(ids(&first), vec!["a", "b"]);
        assert_eq!(first.next_cursor().map(Cursor::as_str), Some("c"));

        let second = store.get_pack(&key(), &sub(), first.next_cursor(), 2).unwrap();
        assert_eq!(ids(&second), vec!["c"]);
        assert!(second.next_cursor().is_none());
    }

    #[test]
    fn exact_fit_has_no_cursor() {
        let store = ReferenceStore::default();
        put(&store, "a", "{}");
        put(&store, "b", "{}");
        let pack = store.get_pack(&key(), &sub(), None, 2).unwrap();
        assert_eq!(pack.len(), 2);
        assert!(pack.next_cursor().is_none());
    }

    #[test]
    fn update_moves_entry_to_end() {
        let store = ReferenceStore::default();
        for id in ["a", "b", "c"] {
            put(&store, id, "{}");
        }
        put(&store, "a", r#"{"v":2}"#);

        let pack = store.get_pack(&key(), &sub(), None, 10).unwrap();
        assert_eq!(ids(&pack), vec!["b", "c", "a"]);
        assert_eq!(pack.values()[2].as_ref().map(AlarmValue::as_str), Some(r#"{"v":2}"#));
    }

    #[test]
    fn delete_removes_entry() {
        let store = ReferenceStore::default();
        put(&store, "a", "{}");
        put(&store, "b", "{}");
        store.delete(&key(), &sub(), &"a".into()).unwrap();
        store.delete(&key(), &sub(), &"never-existed".into()).unwrap();

        let pack = store.get_pack(&key(), &sub(), None, 10).unwrap();
        assert_eq!(ids(&pack), vec!["b"]);
        assert!(pack.values().iter().all(Option::is_some));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn stale_cursor_yields_empty_pack() {
        let store = ReferenceStore::default();
        for id in ["a", "b", "c"] {
            put(&store, id, "{}");
        }
        let first = store.get_pack(&key(), &sub(), None, 2).unwrap();
        store.delete(&key(), &sub(), &"c".into()).unwrap();

        let second = store.get_pack(&key(), &sub(), first.next_cursor(), 2).unwrap();
        assert!(second.is_empty());
        assert!(second.next_cursor().is_none());
    }

    #[test]
    fn scopes_are_isolated() {
        let store = ReferenceStore::new(SubpartitionLayout::new(2).unwrap());
        put(&store, "a", "{}");
        store
            .put(&PartitionKey::new("ala", "kot"), &sub(), &"b".into(), Some(&AlarmValue::new("{}")))
            .unwrap();
        store
            .put(&key(), &"1".into(), &"c".into(), Some(&AlarmValue::new("{}")))
            .unwrap();

        assert_eq!(ids(&store.get_pack(&key(), &sub(), None, 10).unwrap()), vec!["a"]);
        assert_eq!(ids(&store.get_pack(&key(), &"1".into(), None, 10).unwrap()), vec!["c"]);
        assert!(store
            .get_pack(&PartitionKey::new("nobody", "home"), &sub(), None, 10)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn unknown_subpartition_is_rejected() {
        let store = ReferenceStore::default();
        let result = store.put(&key(), &"5".into(), &"a".into(), Some(&AlarmValue::new("{}")));
        assert!(matches!(result, Err(CoreError::UnknownSubpartition { .. })));
        let result = store.get_pack(&key(), &"x".into(), None, 10);
        assert!(matches!(result, Err(CoreError::UnknownSubpartition { .. })));
    }

    #[test]
    fn zero_limit_points_at_first_entry() {
        let store = ReferenceStore::default();
        put(&store, "a", "{}");
        let pack = store.get_pack(&key(), &sub(), None, 0).unwrap();
        assert!(pack.is_empty());
        assert_eq!(pack.next_cursor().map(Cursor::as_str), Some("a"));
    }

    #[test]
    fn lists_layout_subpartitions() {
        let store = ReferenceStore::new(SubpartitionLayout::new(3).unwrap());
        let subs = store.list_subpartitions(&key()).unwrap();
        assert_eq!(subs.len(), 3);
        assert_eq!(subs[2].as_str(), "2");
    }
}
