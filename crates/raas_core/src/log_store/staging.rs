//! Per-call deduplication of records into a pack.

use crate::types::{AlarmValue, Cursor, NotificationId, Pack};
use std::collections::HashMap;

/// Collects records read for one pack.
///
/// A record whose key is already staged replaces the staged record, and the
/// replacement takes the last slot so the pack keeps log order. In the first
/// pack of a traversal a tombstone only cancels what was staged before it:
/// the reader starts from nothing, so there is nothing for it to delete.
pub(crate) struct PackStaging {
    first_pack: bool,
    limit: usize,
    slots: Vec<Option<(NotificationId, Option<AlarmValue>)>>,
    live: HashMap<String, usize>,
}

impl PackStaging {
    pub(crate) fn new(first_pack: bool, limit: usize) -> Self {
        Self {
            first_pack,
            limit,
            slots: Vec::new(),
            live: HashMap::new(),
        }
    }

    pub(crate) fn offer(&mut self, key: String, value: Option<AlarmValue>) {
        if let Some(slot) = self.live.remove(&key) {
            if let Some(staged) = self.slots.get_mut(slot) {
                *staged = None;
            }
        }
        if self.first_pack && value.is_none() {
            return;
        }
        self.live.insert(key.clone(), self.slots.len());
        self.slots.push(Some((NotificationId::new(key), value)));
    }

    pub(crate) fn len(&self) -> usize {
        self.live.len()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.live.len() >= self.limit
    }

    pub(crate) fn into_pack(self, next_cursor: Option<Cursor>) -> Pack {
        Pack::from_entries(self.slots.into_iter().flatten(), next_cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(text: &str) -> Option<AlarmValue> {
        Some(AlarmValue::new(text))
    }

    fn ids(pack: &Pack) -> Vec<&str> {
        pack.notification_ids().iter().map(NotificationId::as_str).collect()
    }

    #[test]
    fn repeated_key_moves_to_end() {
        let mut staging = PackStaging::new(true, 10);
        staging.offer("a".into(), value("1"));
        staging.offer("b".into(), value("1"));
        staging.offer("a".into(), value("2"));
        assert_eq!(staging.len(), 2);

        let pack = staging.into_pack(None);
        assert_eq!(ids(&pack), vec!["b", "a"]);
        assert_eq!(pack.values()[1], value("2"));
    }

    #[test]
    fn first_pack_drops_tombstones() {
        let mut staging = PackStaging::new(true, 10);
        staging.offer("a".into(), value("1"));
        staging.offer("a".into(), None);
        staging.offer("b".into(), None);
        assert_eq!(staging.len(), 0);
        assert!(staging.into_pack(None).is_empty());
    }

    #[test]
    fn later_packs_keep_tombstones() {
        let mut staging = PackStaging::new(false, 10);
        staging.offer("a".into(), value("1"));
        staging.offer("a".into(), None);
        staging.offer("b".into(), None);

        let pack = staging.into_pack(None);
        assert_eq!(ids(&pack), vec!["a", "b"]);
        assert!(pack.values().iter().all(Option::is_none));
    }

    #[test]
    fn full_counts_distinct_keys() {
        let mut staging = PackStaging::new(false, 2);
        staging.offer("a".into(), value("1"));
        staging.offer("a".into(), value("2"));
        assert!(!staging.is_full());
        staging.offer("b".into(), value("1"));
        assert!(staging.is_full());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// Last write per key, ordered by the offset of that write.
        fn last_writes(records: &[(String, Option<String>)]) -> Vec<(String, Option<String>)> {
            let mut last: Vec<(String, Option<String>)> = Vec::new();
            for (key, value) in records {
                last.retain(|(k, _)| k != key);
                last.push((key.clone(), value.clone()));
            }
            last
        }

        fn records() -> impl Strategy<Value = Vec<(String, Option<String>)>> {
            prop::collection::vec(
                (
                    prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(String::from),
                    prop::option::of("[0-9]{1,3}"),
                ),
                0..40,
            )
        }

        fn staged(first_pack: bool, records: &[(String, Option<String>)]) -> Vec<(String, Option<String>)> {
            let mut staging = PackStaging::new(first_pack, usize::MAX);
            for (key, text) in records {
                staging.offer(key.clone(), text.clone().map(AlarmValue::new));
            }
            let (entries, _) = staging.into_pack(None).into_parts();
            entries
                .into_iter()
                .map(|(id, value)| (id.as_str().to_string(), value.map(AlarmValue::into_string)))
                .collect()
        }

        proptest! {
            #[test]
            fn later_pack_is_last_write_wins(records in records()) {
                prop_assert_eq!(staged(false, &records), last_writes(&records));
            }

            #[test]
            fn first_pack_is_live_last_writes(records in records()) {
                let expected: Vec<_> = last_writes(&records)
                    .into_iter()
                    .filter(|(_, value)| value.is_some())
                    .collect();
                prop_assert_eq!(staged(true, &records), expected);
            }
        }
    }
}
