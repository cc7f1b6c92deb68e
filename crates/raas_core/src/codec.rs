//! JSON attribute merging for alarm values.

use crate::error::{CoreError, CoreResult};
use crate::types::AlarmValue;
use serde_json::{Map, Value};

/// Merges a partial update into a previous alarm value.
///
/// Both values must be JSON objects. Attributes of the update overwrite the
/// same attributes of the previous value; all other previous attributes are
/// kept. The store never calls this on its own: callers that send partial
/// updates merge before writing.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValueCodec;

impl ValueCodec {
    /// Creates a codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns `update` merged over `previous`.
    ///
    /// Without a previous value the update is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ValueFormat`] if either value is not a JSON object.
    pub fn patch(&self, previous: Option<&AlarmValue>, update: &AlarmValue) -> CoreResult<AlarmValue> {
        let Some(previous) = previous else {
            return Ok(update.clone());
        };
        let mut merged = parse_object(previous, "previous")?;
        merged.extend(parse_object(update, "new")?);
        serde_json::to_string(&merged)
            .map(AlarmValue::new)
            .map_err(|e| CoreError::value_format(format!("cannot serialize merged value: {e}")))
    }
}

fn parse_object(value: &AlarmValue, which: &str) -> CoreResult<Map<String, Value>> {
    serde_json::from_str(value.as_str())
        .map_err(|e| CoreError::value_format(format!("{which} value is not a JSON object: {e}")))
}
