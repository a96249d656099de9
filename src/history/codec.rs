//! JSON payload for the persisted collection.

use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use super::SentimentRecord;

/// Serialize the collection, in canonical order, as a JSON array.
pub fn encode(records: &[Arc<SentimentRecord>]) -> serde_json::Result<Vec<u8>> {
    let plain: Vec<&SentimentRecord> = records.iter().map(Arc::as_ref).collect();
    serde_json::to_vec(&plain)
}

/// Deserialize a stored payload.
///
/// A top-level value that is not an array decodes to an empty collection.
/// Elements without usable text are dropped; the rest keep their order. Other
/// damaged fields fall back to defaults rather than losing the record.
/// Only malformed JSON is an error.
pub fn decode(bytes: &[u8]) -> serde_json::Result<Vec<SentimentRecord>> {
    let items = match serde_json::from_slice::<Value>(bytes)? {
        Value::Array(items) => items,
        other => {
            warn!(kind = value_kind(&other), "Stored history is not an array, ignoring it");
            return Ok(Vec::new());
        }
    };

    let records = items
        .into_iter()
        .enumerate()
        .filter_map(|(position, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(position, error = %e, "Skipping undecodable history record");
                None
            }
        })
        .collect();

    Ok(records)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
