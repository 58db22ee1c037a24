//! Immutable key/value views of records.

use serde_json::{Map, Value};

use crate::utils::{parse_timestamp, Timestamp};

/// An insertion-ordered JSON object captured from a record or from data
/// embedded in a parent record.
pub type Snapshot = Map<String, Value>;

/// Returns the string at `key`, if present and a string.
#[must_use]
pub fn get_str<'a>(snapshot: &'a Snapshot, key: &str) -> Option<&'a str> {
    snapshot.get(key).and_then(Value::as_str)
}

/// Returns the object at `key`, if present and an object.
#[must_use]
pub fn get_map<'a>(snapshot: &'a Snapshot, key: &str) -> Option<&'a Snapshot> {
    snapshot.get(key).and_then(Value::as_object)
}

/// Returns the boolean at `key`, if present and a boolean.
#[must_use]
pub fn get_bool(snapshot: &Snapshot, key: &str) -> Option<bool> {
    snapshot.get(key).and_then(Value::as_bool)
}

/// Returns the non-negative count at `key`, or zero.
#[must_use]
pub fn get_count(snapshot: &Snapshot, key: &str) -> u64 {
    snapshot.get(key).and_then(Value::as_u64).unwrap_or(0)
}

/// Returns the parsed timestamp at `key`. Unparseable values read as absent.
#[must_use]
pub fn get_timestamp(snapshot: &Snapshot, key: &str) -> Option<Timestamp> {
    get_str(snapshot, key).and_then(|s| parse_timestamp(s).ok())
}
