//! Record fixtures for work-unit and link tests.

use serde_json::{json, Value};

use crate::core::{ResourceKind, Snapshot};

/// Cluster id used by fixtures.
pub const FIXTURE_CLUSTER: &str = "zzzzz";

/// Returns a well-formed UUID of `kind`, numbered `n`.
#[must_use]
pub fn fixture_uuid(kind: ResourceKind, n: u64) -> String {
    format!("{FIXTURE_CLUSTER}-{}-{n:015}", kind.uuid_infix())
}

/// Converts a JSON object into a snapshot. Anything else gives an empty one.
#[must_use]
pub fn snapshot(value: Value) -> Snapshot {
    match value {
        Value::Object(map) => map,
        _ => Snapshot::new(),
    }
}

/// A component that references (and embeds) a job.
#[must_use]
pub fn job_component(uuid: &str, state: &str) -> Value {
    json!({ "job": { "uuid": uuid, "state": state } })
}

/// Builder for record snapshots.
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    record: Snapshot,
}

impl RecordBuilder {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a record with the given UUID.
    #[must_use]
    pub fn with_uuid(uuid: impl Into<String>) -> Self {
        Self::new().with_field("uuid", Value::String(uuid.into()))
    }

    /// Starts a job record numbered `n`.
    #[must_use]
    pub fn job(n: u64) -> Self {
        Self::with_uuid(fixture_uuid(ResourceKind::Job, n))
    }

    /// Starts a pipeline instance record numbered `n`.
    #[must_use]
    pub fn pipeline(n: u64) -> Self {
        Self::with_uuid(fixture_uuid(ResourceKind::PipelineInstance, n))
    }

    /// Sets an arbitrary field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.record.insert(key.into(), value);
        self
    }

    /// Sets the state.
    #[must_use]
    pub fn with_state(self, state: &str) -> Self {
        self.with_field("state", json!(state))
    }

    /// Sets the explicit success flag.
    #[must_use]
    pub fn with_success(self, success: bool) -> Self {
        self.with_field("success", json!(success))
    }

    /// Sets a job's task summary.
    #[must_use]
    pub fn with_tasks(self, done: u64, failed: u64, running: u64, todo: u64) -> Self {
        self.with_field(
            "tasks_summary",
            json!({ "done": done, "failed": failed, "running": running, "todo": todo }),
        )
    }

    /// Appends a component to a pipeline's `components` map.
    #[must_use]
    pub fn with_component(mut self, name: impl Into<String>, component: Value) -> Self {
        let components = self
            .record
            .entry("components")
            .or_insert_with(|| Value::Object(Snapshot::new()));
        if let Value::Object(map) = components {
            map.insert(name.into(), component);
        }
        self
    }

    /// Returns the finished snapshot.
    #[must_use]
    pub fn build(self) -> Snapshot {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::get_str;

    #[test]
    fn test_fixture_uuids_have_expected_kind() {
        let uuid = fixture_uuid(ResourceKind::Job, 7);
        assert_eq!(uuid, "zzzzz-8i9sb-000000000000007");
        assert_eq!(ResourceKind::for_uuid(&uuid), Some(ResourceKind::Job));
    }

    #[test]
    fn test_builder_keeps_component_order() {
        let record = RecordBuilder::pipeline(1)
            .with_state("RunningOnServer")
            .with_component("z", json!({}))
            .with_component("a", json!({}))
            .build();

        assert_eq!(get_str(&record, "state"), Some("RunningOnServer"));
        let names: Vec<_> = record["components"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(names, vec!["z", "a"]);
    }
}
