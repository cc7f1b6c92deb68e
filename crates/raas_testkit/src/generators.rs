//! Property-based test generators using proptest.
//!
//! Provides strategies for generating store operations over a small pool of
//! identifiers, so that updates and deletes of existing alarms are frequent.

use proptest::prelude::*;
use raas_core::{AlarmStore, AlarmValue, CoreResult, NotificationId, PartitionKey, Subpartition};
use std::collections::BTreeMap;

/// A write against one subpartition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// Create or replace an alarm.
    Put {
        /// Notification identifier.
        id: String,
        /// JSON value.
        value: String,
    },
    /// Delete an alarm.
    Delete {
        /// Notification identifier.
        id: String,
    },
}

impl StoreOp {
    /// Applies the operation to `store`.
    pub fn apply(
        &self,
        store: &dyn AlarmStore,
        partition: &PartitionKey,
        subpartition: &Subpartition,
    ) -> CoreResult<()> {
        match self {
            StoreOp::Put { id, value } => store.put(
                partition,
                subpartition,
                &NotificationId::new(id.as_str()),
                Some(&AlarmValue::new(value.as_str())),
            ),
            StoreOp::Delete { id } => {
                store.delete(partition, subpartition, &NotificationId::new(id.as_str()))
            }
        }
    }
}

/// Expected active set, maintained alongside a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSetModel {
    alarms: BTreeMap<String, String>,
}

impl ActiveSetModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the effect of `op`.
    pub fn apply(&mut self, op: &StoreOp) {
        match op {
            StoreOp::Put { id, value } => {
                self.alarms.insert(id.clone(), value.clone());
            }
            StoreOp::Delete { id } => {
                self.alarms.remove(id);
            }
        }
    }

    /// Returns the expected active alarms.
    pub fn alarms(&self) -> &BTreeMap<String, String> {
        &self.alarms
    }
}

/// Strategy for generating notification identifiers from a pool of `pool` names.
pub fn notification_id_strategy(pool: usize) -> impl Strategy<Value = String> {
    (0..pool.max(1)).prop_map(|n| format!("alarm:{n}"))
}

/// Strategy for generating small JSON alarm values.
pub fn alarm_value_strategy() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["CRITICAL", "MAJOR", "MINOR", "CLEARED"]),
        any::<u16>(),
    )
        .prop_map(|(severity, counter)| {
            serde_json::json!({ "perceivedSeverity": severity, "counter": counter }).to_string()
        })
}

/// Strategy for generating one operation; puts are twice as likely as deletes.
pub fn store_op_strategy(pool: usize) -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        2 => (notification_id_strategy(pool), alarm_value_strategy())
            .prop_map(|(id, value)| StoreOp::Put { id, value }),
        1 => notification_id_strategy(pool).prop_map(|id| StoreOp::Delete { id }),
    ]
}

/// Strategy for generating operation sequences.
pub fn store_ops_strategy(pool: usize, max_len: usize) -> impl Strategy<Value = Vec<StoreOp>> {
    prop::collection::vec(store_op_strategy(pool), 0..=max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn ids_stay_in_pool(id in notification_id_strategy(4)) {
            prop_assert!(["alarm:0", "alarm:1", "alarm:2", "alarm:3"].contains(&id.as_str()));
        }

        #[test]
        fn values_are_json_objects(value in alarm_value_strategy()) {
            let parsed: serde_json::Value = serde_json::from_str(&value).unwrap();
            prop_assert!(parsed.is_object());
        }
    }

    #[test]
    fn model_tracks_last_write() {
        let mut model = ActiveSetModel::new();
        model.apply(&StoreOp::Put { id: "a".into(), value: "1".into() });
        model.apply(&StoreOp::Put { id: "b".into(), value: "1".into() });
        model.apply(&StoreOp::Put { id: "a".into(), value: "2".into() });
        model.apply(&StoreOp::Delete { id: "b".into() });
        model.apply(&StoreOp::Delete { id: "never".into() });

        let expected: BTreeMap<_, _> = [("a".to_string(), "2".to_string())].into_iter().collect();
        assert_eq!(model.alarms(), &expected);
    }
}
