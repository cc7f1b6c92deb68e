//! Snapshot command implementation.
//!
//! Runs a complete traversal the way a client does: start without a cursor,
//! follow every next cursor and apply each pack to a local map.

use super::StoreArgs;
use raas_core::{AlarmStore, Cursor, Subpartition};
use serde::Serialize;
use std::collections::BTreeMap;

/// Result of a traversal.
#[derive(Debug, Default, Serialize)]
pub struct Snapshot {
    /// Number of packs read.
    pub packs: usize,
    /// Active alarms by identifier.
    pub alarms: BTreeMap<String, String>,
}

/// Traverses every pack of a subpartition and applies it.
pub fn traverse(
    store: &dyn AlarmStore,
    args: &StoreArgs,
    subpartition: &str,
    page: usize,
) -> Result<Snapshot, raas_core::CoreError> {
    let partition = args.partition();
    let subpartition = Subpartition::new(subpartition);
    let mut snapshot = Snapshot::default();
    let mut cursor: Option<Cursor> = None;

    loop {
        let pack = store.get_pack(&partition, &subpartition, cursor.as_ref(), page.max(1))?;
        snapshot.packs += 1;
        let (entries, next) = pack.into_parts();
        for (id, value) in entries {
            match value {
                Some(value) => snapshot.alarms.insert(id.as_str().to_string(), value.into_string()),
                None => snapshot.alarms.remove(id.as_str()),
            };
        }
        match next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    Ok(snapshot)
}

/// Runs the snapshot command.
pub fn run(
    args: &StoreArgs,
    subpartition: &str,
    page: usize,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = args.open_store()?;
    let snapshot = traverse(&store, args, subpartition, page)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        _ => {
            println!(
                "Active alarms ({} total, {} packs)",
                snapshot.alarms.len(),
                snapshot.packs
            );
            println!("================");
            for (id, value) in &snapshot.alarms {
                println!("{id}\t{value}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::log_args;
    use raas_core::AlarmValue;

    #[test]
    fn traversal_applies_packs() {
        let dir = tempfile::tempdir().unwrap();
        let args = log_args(dir.path());
        let store = args.open_store().unwrap();
        let partition = args.partition();
        let sub = Subpartition::new("0");

        for id in ["a", "b", "c", "d"] {
            store
                .put(&partition, &sub, &id.into(), Some(&AlarmValue::new(format!("{{\"id\":\"{id}\"}}"))))
                .unwrap();
        }
        store.delete(&partition, &sub, &"b".into()).unwrap();
        store
            .put(&partition, &sub, &"a".into(), Some(&AlarmValue::new("{}")))
            .unwrap();

        let snapshot = traverse(&store, &args, "0", 2).unwrap();
        let ids: Vec<_> = snapshot.alarms.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["a", "c", "d"]);
        assert_eq!(snapshot.alarms["a"], "{}");
        assert!(snapshot.packs > 1);
    }
}
