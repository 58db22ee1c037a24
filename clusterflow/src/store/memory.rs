//! In-memory record store.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Filter, RecordQuery, RecordStore};
use crate::core::{get_str, ResourceKind, Snapshot};
use crate::errors::StoreError;

/// A record store held in memory, in insertion order.
///
/// Records inserted with [`MemoryStore::insert_hidden`] exist but are not
/// readable by the current identity, so every read path skips them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<Snapshot>>,
    hidden: RwLock<HashSet<String>>,
    fetch_many_calls: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = Snapshot>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Inserts a readable record, replacing any record with the same UUID.
    pub fn insert(&self, record: Snapshot) {
        let mut records = self.records.write();
        if let Some(uuid) = get_str(&record, "uuid") {
            if let Some(existing) = records
                .iter_mut()
                .find(|r| get_str(r, "uuid") == Some(uuid))
            {
                *existing = record;
                return;
            }
        }
        records.push(record);
    }

    /// Inserts a record the current identity cannot read.
    pub fn insert_hidden(&self, record: Snapshot) {
        if let Some(uuid) = get_str(&record, "uuid") {
            self.hidden.write().insert(uuid.to_string());
        }
        self.insert(record);
    }

    /// Returns the number of stored records, readable or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Returns how many batch fetches have been served.
    #[must_use]
    pub fn fetch_many_calls(&self) -> usize {
        self.fetch_many_calls.load(Ordering::SeqCst)
    }

    fn is_readable(&self, record: &Snapshot) -> bool {
        match get_str(record, "uuid") {
            Some(uuid) => !self.hidden.read().contains(uuid),
            None => true,
        }
    }

    fn readable(&self) -> Vec<Snapshot> {
        self.records
            .read()
            .iter()
            .filter(|r| self.is_readable(r))
            .cloned()
            .collect()
    }
}

impl RecordStore for MemoryStore {
    fn fetch_many(&self, uuids: &[String]) -> Result<Vec<Snapshot>, StoreError> {
        self.fetch_many_calls.fetch_add(1, Ordering::SeqCst);
        let wanted: HashSet<&str> = uuids.iter().map(String::as_str).collect();
        Ok(self
            .readable()
            .into_iter()
            .filter(|r| get_str(r, "uuid").is_some_and(|u| wanted.contains(u)))
            .collect())
    }

    fn fetch(&self, uuid: &str) -> Result<Option<Snapshot>, StoreError> {
        Ok(self
            .readable()
            .into_iter()
            .find(|r| get_str(r, "uuid") == Some(uuid)))
    }

    fn list(&self, query: &RecordQuery) -> Result<Vec<Snapshot>, StoreError> {
        let mut out = Vec::new();
        for record in self.readable() {
            if matches_query(&record, query)? {
                out.push(record);
            }
        }
        Ok(out)
    }
}

fn matches_query(record: &Snapshot, query: &RecordQuery) -> Result<bool, StoreError> {
    for (attribute, expected) in &query.where_clause {
        let actual = record.get(attribute).unwrap_or(&Value::Null);
        let ok = match expected {
            Value::Array(options) => options.contains(actual),
            other => actual == other,
        };
        if !ok {
            return Ok(false);
        }
    }
    for filter in &query.filters {
        if !matches_filter(record, filter)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches_filter(record: &Snapshot, filter: &Filter) -> Result<bool, StoreError> {
    let actual = record.get(&filter.attribute).unwrap_or(&Value::Null);
    match filter.operator.as_str() {
        Filter::EQ => Ok(actual == &filter.operand),
        Filter::NE => Ok(actual != &filter.operand),
        Filter::IN => Ok(operand_list(filter)?.contains(actual)),
        Filter::NOT_IN => Ok(!operand_list(filter)?.contains(actual)),
        Filter::IS_A => {
            let kinds = operand_kinds(filter)?;
            Ok(actual
                .as_str()
                .and_then(ResourceKind::for_uuid)
                .is_some_and(|k| kinds.contains(&k)))
        }
        other => Err(StoreError::InvalidQuery(format!(
            "unsupported operator '{other}' on '{}'",
            filter.attribute
        ))),
    }
}

fn operand_list(filter: &Filter) -> Result<&Vec<Value>, StoreError> {
    filter.operand.as_array().ok_or_else(|| {
        StoreError::InvalidQuery(format!(
            "operator '{}' on '{}' requires a list",
            filter.operator, filter.attribute
        ))
    })
}

fn operand_kinds(filter: &Filter) -> Result<Vec<ResourceKind>, StoreError> {
    let names: Vec<&Value> = match &filter.operand {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };
    names
        .into_iter()
        .map(|v| {
            v.as_str()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| StoreError::InvalidQuery(format!("invalid type {v} for is_a")))
        })
        .collect()
}
