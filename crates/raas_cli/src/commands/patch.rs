//! Patch command implementation.

use raas_core::{AlarmValue, CoreResult, ValueCodec};

/// Merges `update` onto `previous`. An empty previous value means none.
pub fn merge(previous: &str, update: &str) -> CoreResult<AlarmValue> {
    let previous = (!previous.trim().is_empty()).then(|| AlarmValue::new(previous));
    ValueCodec::new().patch(previous.as_ref(), &AlarmValue::new(update))
}

/// Runs the patch command.
pub fn run(previous: &str, update: &str) -> CoreResult<()> {
    println!("{}", merge(previous, update)?);
    Ok(())
}
