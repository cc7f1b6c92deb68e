//! A full traversal reconstructs the active set.

use proptest::prelude::*;
use raas_core::AlarmStore;
use raas_testkit::prelude::*;

fn write(store: &dyn AlarmStore, model: &mut ActiveSetModel, ops: &[StoreOp]) {
    let partition = EXISTING_ALARM.partition();
    let sub = default_subpartition();
    for op in ops {
        op.apply(store, &partition, &sub).unwrap();
        model.apply(op);
    }
}

fn traversal(store: &dyn AlarmStore, page: usize) -> Traversal {
    traverse(store, &EXISTING_ALARM.partition(), &default_subpartition(), page).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn traversal_matches_model(
        ops in store_ops_strategy(8, 60),
        page in 1usize..6,
    ) {
        for backend in TestBackend::ALL {
            let store = TestStore::new(backend);
            let mut model = ActiveSetModel::new();
            write(&*store, &mut model, &ops);

            let result = traversal(&*store, page);
            prop_assert_eq!(&result.alarms, model.alarms(), "backend {}", backend);
        }
    }

    #[test]
    fn first_pack_never_has_tombstones(
        ops in store_ops_strategy(6, 40),
        page in 1usize..10,
    ) {
        for backend in TestBackend::ALL {
            let store = TestStore::new(backend);
            write(&*store, &mut ActiveSetModel::new(), &ops);

            let pack = store
                .get_pack(&EXISTING_ALARM.partition(), &default_subpartition(), None, page)
                .unwrap();
            prop_assert!(pack.values().iter().all(Option::is_some), "backend {}", backend);
            prop_assert!(pack.len() <= page);

            let mut ids = pack_ids(&pack);
            let before = ids.len();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(ids.len(), before, "duplicate id in pack on {}", backend);
        }
    }

    #[test]
    fn interleaved_writes_on_log_backends(
        before in store_ops_strategy(6, 30),
        during in prop::collection::vec(store_ops_strategy(6, 4), 1..6),
        page in 1usize..4,
    ) {
        for backend in TestBackend::LOGS {
            let store = TestStore::new(backend);
            let mut model = ActiveSetModel::new();
            write(&*store, &mut model, &before);

            let mut chunks = during.iter();
            let result = traverse_with(
                &*store,
                &EXISTING_ALARM.partition(),
                &default_subpartition(),
                page,
                |_| {
                    if let Some(chunk) = chunks.next() {
                        write(&*store, &mut model, chunk);
                    }
                    Ok(())
                },
            )
            .unwrap();

            // Chunks left over were never interleaved; a new traversal sees them.
            let leftover: Vec<StoreOp> = chunks.flatten().cloned().collect();
            if leftover.is_empty() {
                prop_assert_eq!(&result.alarms, model.alarms(), "backend {}", backend);
            } else {
                write(&*store, &mut model, &leftover);
                let again = traversal(&*store, page);
                prop_assert_eq!(&again.alarms, model.alarms(), "backend {}", backend);
            }
        }
    }

    #[test]
    fn restarted_client_starts_over(
        ops in store_ops_strategy(6, 40),
        page in 1usize..4,
        stop_after in 1usize..4,
    ) {
        for backend in TestBackend::ALL {
            let store = TestStore::new(backend);
            let mut model = ActiveSetModel::new();
            write(&*store, &mut model, &ops);

            // Abandon a traversal part way, then start again from nothing.
            let mut cursor: Option<raas_core::Cursor> = None;
            for _ in 0..stop_after {
                let pack = store
                    .get_pack(&EXISTING_ALARM.partition(), &default_subpartition(), cursor.as_ref(), page)
                    .unwrap();
                cursor = pack.next_cursor().cloned();
                if cursor.is_none() {
                    break;
                }
            }

            let result = traversal(&*store, page);
            prop_assert_eq!(&result.alarms, model.alarms(), "backend {}", backend);
        }
    }
}
