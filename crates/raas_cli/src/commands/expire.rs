//! Expire command implementation.

use super::{CliError, StoreArgs};
use raas_core::{AlarmStore, BackendKind};
use raas_log::now_millis;

/// Runs the expire command.
pub fn run(args: &StoreArgs) -> Result<(), CliError> {
    if args.backend != BackendKind::Log {
        return Err(CliError::LogBackendOnly("expire"));
    }
    let store = args.open_store()?;
    let removed = store.enforce_retention(now_millis())?;
    println!("expired {removed} records");
    Ok(())
}
