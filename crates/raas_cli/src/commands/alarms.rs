//! Single-operation store commands.

use super::{CliError, StoreArgs};
use raas_core::{AlarmStore, AlarmValue, Cursor, NotificationId, Pack, Subpartition};

/// Runs the put command.
pub fn put(args: &StoreArgs, subpartition: &str, id: &str, value: &str) -> Result<(), CliError> {
    let store = args.open_store()?;
    store.put(
        &args.partition(),
        &Subpartition::new(subpartition),
        &NotificationId::new(id),
        Some(&AlarmValue::new(value)),
    )?;
    println!("saved {id}");
    Ok(())
}

/// Runs the delete command.
pub fn delete(args: &StoreArgs, subpartition: &str, id: &str) -> Result<(), CliError> {
    let store = args.open_store()?;
    store.delete(&args.partition(), &Subpartition::new(subpartition), &NotificationId::new(id))?;
    println!("deleted {id}");
    Ok(())
}

/// Runs the get-pack command.
pub fn get_pack(
    args: &StoreArgs,
    subpartition: &str,
    cursor: Option<String>,
    how_many: usize,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = args.open_store()?;
    let cursor = cursor.map(Cursor::new);
    let pack = store.get_pack(
        &args.partition(),
        &Subpartition::new(subpartition),
        cursor.as_ref(),
        how_many,
    )?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&pack)?),
        _ => print_text_output(&pack),
    }
    Ok(())
}

/// Runs the subpartitions command.
pub fn subpartitions(args: &StoreArgs) -> Result<(), CliError> {
    let store = args.open_store()?;
    for subpartition in store.list_subpartitions(&args.partition())? {
        println!("{subpartition}");
    }
    Ok(())
}

fn print_text_output(pack: &Pack) {
    println!("Pack ({} entries)", pack.len());
    println!("================");
    for (id, value) in pack.iter() {
        match value {
            Some(value) => println!("{id}\t{value}"),
            None => println!("{id}\t(deleted)"),
        }
    }
    match pack.next_cursor() {
        Some(cursor) => println!("next: {cursor}"),
        None => println!("next: none"),
    }
}
