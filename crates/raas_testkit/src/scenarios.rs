//! Store scenarios reusable across backends.
//!
//! Every scenario takes the store it runs on, so the same expectations are
//! checked against each backend. Scenarios `t1` to `t4` build on each other
//! and must run in order on one store; the others need a fresh store.

use crate::fixtures::{default_subpartition, delete_all, put_all, EXISTING_ALARM, TEST_KEYS};
use raas_core::{AlarmStore, AlarmValue, CoreResult, Cursor, NotificationId, Pack, PartitionKey, Subpartition};
use std::collections::BTreeMap;

/// Returns the identifiers of a pack.
pub fn pack_ids(pack: &Pack) -> Vec<&str> {
    pack.notification_ids()
        .iter()
        .map(NotificationId::as_str)
        .collect()
}

/// Outcome of a complete traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Traversal {
    /// Reconstructed active alarms.
    pub alarms: BTreeMap<String, String>,
    /// Number of packs read.
    pub packs: usize,
}

/// Reads packs of `page` entries until the next cursor is `None`, applying
/// each pack to an initially empty map.
///
/// `between_packs` runs after every pack that has a successor, with the
/// number of packs read so far.
pub fn traverse_with<F>(
    store: &dyn AlarmStore,
    partition: &PartitionKey,
    subpartition: &Subpartition,
    page: usize,
    mut between_packs: F,
) -> CoreResult<Traversal>
where
    F: FnMut(usize) -> CoreResult<()>,
{
    let mut traversal = Traversal::default();
    let mut cursor: Option<Cursor> = None;
    loop {
        let pack = store.get_pack(partition, subpartition, cursor.as_ref(), page)?;
        traversal.packs += 1;
        let (entries, next) = pack.into_parts();
        for (id, value) in entries {
            match value {
                Some(value) => {
                    traversal
                        .alarms
                        .insert(id.as_str().to_string(), value.into_string());
                }
                None => {
                    traversal.alarms.remove(id.as_str());
                }
            }
        }
        match next {
            Some(next) => {
                cursor = Some(next);
                between_packs(traversal.packs)?;
            }
            None => return Ok(traversal),
        }
    }
}

/// Reads packs until the next cursor is `None` with no writes in between.
pub fn traverse(
    store: &dyn AlarmStore,
    partition: &PartitionKey,
    subpartition: &Subpartition,
    page: usize,
) -> CoreResult<Traversal> {
    traverse_with(store, partition, subpartition, page, |_| Ok(()))
}

/// Test scenarios that can be reused to test different backends.
pub struct StoreScenarios<'a> {
    store: &'a dyn AlarmStore,
}

impl<'a> StoreScenarios<'a> {
    /// Creates scenarios for `store`.
    pub fn new(store: &'a dyn AlarmStore) -> Self {
        Self { store }
    }

    fn query(&self, cursor: Option<&Cursor>, how_many: usize) -> Pack {
        self.store
            .get_pack(
                &EXISTING_ALARM.partition(),
                &default_subpartition(),
                cursor,
                how_many,
            )
            .expect("Failed to query alarms")
    }

    fn put(&self, id: &str, json: &str) {
        self.store
            .put(
                &EXISTING_ALARM.partition(),
                &default_subpartition(),
                &id.into(),
                Some(&AlarmValue::new(json)),
            )
            .expect("Failed to put alarm");
    }

    fn assert_single_existing(&self, json: &str) {
        let pack = self.query(None, 5);
        assert_eq!(pack_ids(&pack), vec![EXISTING_ALARM.notification_id]);
        assert_eq!(pack.values().len(), 1);
        assert_eq!(pack.values()[0].as_ref().map(AlarmValue::as_str), Some(json));
    }

    /// A created alarm is returned.
    pub fn t1_when_created_a_new_alarm_then_return_it(&self) {
        self.put(EXISTING_ALARM.notification_id, EXISTING_ALARM.json);
        self.assert_single_existing(EXISTING_ALARM.json);
    }

    /// An existing alarm keeps being returned.
    pub fn t2_when_alarm_exists_then_should_be_returned(&self) {
        self.assert_single_existing(EXISTING_ALARM.json);
    }

    /// Writing an existing identifier replaces its value.
    pub fn t3_when_upserting_an_existing_alarm_then_update_it(&self) {
        let new_json = "{\"additionalText\":\"serious stuff\"}";
        self.put(EXISTING_ALARM.notification_id, new_json);
        self.assert_single_existing(new_json);
    }

    /// A deleted alarm is not returned.
    pub fn t4_when_removed_an_existing_alarm_then_do_not_return_it(&self) {
        self.put(EXISTING_ALARM.notification_id, "{\"additionalText\":\"serious stuff\"}");
        delete_all(self.store, &[EXISTING_ALARM.notification_id]);

        let pack = self.query(None, 5);
        assert!(pack.notification_ids().is_empty());
        assert!(pack.values().is_empty());
    }

    /// Alarms come back in write order.
    pub fn t5_when_put_three_alarms_then_keep_their_order(&self) {
        put_all(self.store, &TEST_KEYS);
        let pack = self.query(None, 5);
        assert_eq!(pack_ids(&pack), TEST_KEYS.to_vec());
    }

    /// Replays puts, deletes and updates, then checks full, first and
    /// continued packs after each update. Needs an empty log backend: the
    /// expected continuations follow from log offsets.
    pub fn t6_when_get_two_alarms_then_provide_tag_of_next_alarm(&self) {
        let [a, b, c] = TEST_KEYS;

        // log: a b c
        put_all(self.store, &TEST_KEYS);
        // log: a b c xa xb xc
        delete_all(self.store, &TEST_KEYS);
        // log: a b c xa xb xc a b c
        put_all(self.store, &TEST_KEYS);
        self.check_for_t6(&[a, b, c], &[a, b], &[a, b, c]);

        // An updated alarm is returned in the first pack and again in the second.
        put_all(self.store, &[a]);
        self.check_for_t6(&[b, c, a], &[a, b], &[b, c, a]);

        put_all(self.store, &[c]);
        self.check_for_t6(&[b, a, c], &[a, b], &[b, a, c]);
    }

    fn check_for_t6(&self, all_expected: &[&str], first_expected: &[&str], second_expected: &[&str]) {
        let all = self.query(None, 5);
        assert_eq!(pack_ids(&all), all_expected);
        assert!(all.next_cursor().is_none());

        let first = self.query(None, 2);
        assert_eq!(pack_ids(&first), first_expected);
        assert!(first.next_cursor().is_some());

        let second = self.query(first.next_cursor(), 5);
        assert_eq!(pack_ids(&second), second_expected);
        assert!(second.next_cursor().is_none());
    }

    /// Pages of the reference backend resume at the cursor entry and never
    /// repeat an entry across pages.
    pub fn reference_pagination(&self) {
        let [a, b, c] = TEST_KEYS;
        put_all(self.store, &TEST_KEYS);
        put_all(self.store, &[a]);

        let first = self.query(None, 2);
        assert_eq!(pack_ids(&first), vec![b, c]);
        assert_eq!(first.next_cursor().map(Cursor::as_str), Some(a));

        let second = self.query(first.next_cursor(), 2);
        assert_eq!(pack_ids(&second), vec![a]);
        assert!(second.next_cursor().is_none());
    }

    /// Restarting a traversal without a cursor yields the current active set.
    pub fn idempotent_restart(&self) {
        put_all(self.store, &TEST_KEYS);
        delete_all(self.store, &TEST_KEYS[1..2]);

        let partition = EXISTING_ALARM.partition();
        let sub = default_subpartition();
        let first = traverse(self.store, &partition, &sub, 1).expect("Failed to traverse");
        let second = traverse(self.store, &partition, &sub, 2).expect("Failed to traverse");
        assert_eq!(first.alarms, second.alarms);

        let ids: Vec<_> = first.alarms.keys().map(String::as_str).collect();
        let mut expected = vec![TEST_KEYS[0], TEST_KEYS[2]];
        expected.sort_unstable();
        assert_eq!(ids, expected);
    }

    /// Deleting every alarm leaves an empty, final first pack once the pack
    /// is large enough to read past the tombstones.
    pub fn delete_then_empty(&self) {
        put_all(self.store, &TEST_KEYS);
        delete_all(self.store, &TEST_KEYS);

        let pack = self.query(None, 2 * TEST_KEYS.len());
        assert!(pack.is_empty());
        assert!(pack.next_cursor().is_none());
    }

    /// A first pack that stops before a tombstone carries the deleted alarm;
    /// the continuation delivers the tombstone. Needs an empty log backend.
    pub fn small_first_pack_then_tombstones(&self) {
        let [a, b, c] = TEST_KEYS;
        // log: a b c xa xb xc
        put_all(self.store, &TEST_KEYS);
        delete_all(self.store, &TEST_KEYS);

        let first = self.query(None, 1);
        assert_eq!(pack_ids(&first), vec![a]);
        assert!(first.values()[0].is_some());
        assert_eq!(first.next_cursor(), Some(&Cursor::from_offset(1)));

        let rest = self.query(first.next_cursor(), 10);
        assert_eq!(pack_ids(&rest), vec![a, b, c]);
        assert!(rest.values().iter().all(Option::is_none));
        assert!(rest.next_cursor().is_none());

        let partition = EXISTING_ALARM.partition();
        let traversal = traverse(self.store, &partition, &default_subpartition(), 1)
            .expect("Failed to traverse");
        assert!(traversal.alarms.is_empty());
    }

    /// Partitions and subpartitions never see each other's alarms.
    pub fn partitions_are_isolated(&self) {
        put_all(self.store, &TEST_KEYS);
        let other = PartitionKey::new(EXISTING_ALARM.domain, "somebody-else");
        let pack = self
            .store
            .get_pack(&other, &default_subpartition(), None, 10)
            .expect("Failed to query alarms");
        assert!(pack.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raas_core::{ReferenceStore, SubpartitionLayout};

    #[test]
    fn traverse_counts_packs() {
        let store = ReferenceStore::new(SubpartitionLayout::default());
        put_all(&store, &TEST_KEYS);

        let mut calls = 0;
        let traversal = traverse_with(
            &store,
            &EXISTING_ALARM.partition(),
            &default_subpartition(),
            1,
            |packs| {
                calls += 1;
                assert_eq!(packs, calls);
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(traversal.packs, 3);
        assert_eq!(calls, 2);
        assert_eq!(traversal.alarms.len(), 3);
    }

    #[test]
    fn reference_scenarios() {
        let store = ReferenceStore::new(SubpartitionLayout::default());
        StoreScenarios::new(&store).reference_pagination();
    }
}
