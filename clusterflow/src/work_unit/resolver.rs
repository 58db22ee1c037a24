//! Turning records and component maps into work units.
//!
//! A pipeline's components are classified with an explicit decision table
//! ([`classify`]) against a job index fetched in a single batch. Nothing here
//! inspects runtime types; the shape of the JSON decides.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{Children, JobWorkUnit, PipelineInstanceWorkUnit, ProxyWorkUnit, WorkUnitRef};
use crate::core::{get_str, ResourceKind, Snapshot};
use crate::errors::StoreError;
use crate::store::RecordStore;

/// Job records keyed by UUID.
pub type JobIndex = HashMap<String, Snapshot>;

/// How a single component will be materialized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComponentShape<'a> {
    /// The component references a job found in the index; wrap the fetched
    /// record.
    LiveJob(&'a Snapshot),
    /// The component embeds a job we could not fetch; wrap the embedded copy.
    EmbeddedJob(&'a Snapshot),
    /// The component has no job; wrap the component map itself.
    Opaque(&'a Snapshot),
    /// Nothing we know how to read.
    Unrecognized,
}

/// Decides the shape of one component.
///
/// | component | `job` value          | UUID in index | shape          |
/// |-----------|----------------------|---------------|----------------|
/// | map       | map                  | yes           | `LiveJob`      |
/// | map       | map                  | no / none     | `EmbeddedJob`  |
/// | map       | absent or null       | -             | `Opaque`       |
/// | map       | anything else        | -             | `Unrecognized` |
/// | not a map | -                    | -             | `Unrecognized` |
#[must_use]
pub fn classify<'a>(component: &'a Value, index: &'a JobIndex) -> ComponentShape<'a> {
    let Some(map) = component.as_object() else {
        return ComponentShape::Unrecognized;
    };
    match map.get("job") {
        None | Some(Value::Null) => ComponentShape::Opaque(map),
        Some(Value::Object(job)) => get_str(job, "uuid")
            .and_then(|uuid| index.get(uuid))
            .map_or(ComponentShape::EmbeddedJob(job), ComponentShape::LiveJob),
        Some(_) => ComponentShape::Unrecognized,
    }
}

/// Returns the distinct job UUIDs referenced by `components`, in
/// declaration order.
#[must_use]
pub fn referenced_job_uuids(components: &Snapshot) -> Vec<String> {
    let mut seen = HashSet::new();
    components
        .values()
        .filter_map(|c| c.get("job")?.get("uuid")?.as_str())
        .filter(|uuid| seen.insert(*uuid))
        .map(str::to_string)
        .collect()
}

/// Fetches every job referenced by `components` in one batch.
///
/// Issues no request when nothing is referenced.
///
/// # Errors
///
/// Returns the store's error unchanged.
pub fn fetch_job_index(
    store: &dyn RecordStore,
    components: &Snapshot,
) -> Result<JobIndex, StoreError> {
    let uuids = referenced_job_uuids(components);
    if uuids.is_empty() {
        return Ok(JobIndex::new());
    }
    let records = store.fetch_many(&uuids)?;
    debug!(
        requested = uuids.len(),
        found = records.len(),
        "Fetched job index"
    );
    Ok(records
        .into_iter()
        .filter_map(|r| Some((get_str(&r, "uuid")?.to_string(), r)))
        .collect())
}

/// The children of one pipeline instance.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Children produced before enumeration stopped, in declaration order.
    pub children: Children,
    /// True if enumeration stopped at an unrecognized component.
    pub unreadable_children: bool,
}

impl Resolution {
    fn new(children: Vec<WorkUnitRef>, unreadable_children: bool) -> Self {
        Self {
            children: Arc::from(children),
            unreadable_children,
        }
    }
}

/// Materializes the children described by a pipeline's `components` value.
///
/// A missing or null value means no children. Any other non-map value, or
/// the first unrecognized component, sets the unreadable flag and stops.
#[must_use]
pub fn resolve_components(components: Option<&Value>, index: &JobIndex) -> Resolution {
    let map = match components {
        None | Some(Value::Null) => return Resolution::new(Vec::new(), false),
        Some(Value::Object(map)) => map,
        Some(_) => {
            warn!("Pipeline components are not a map");
            return Resolution::new(Vec::new(), true);
        }
    };

    let mut children: Vec<WorkUnitRef> = Vec::with_capacity(map.len());
    for (name, component) in map {
        let label = Some(name.clone());
        let child: WorkUnitRef = match classify(component, index) {
            ComponentShape::LiveJob(record) => Arc::new(JobWorkUnit::new(record.clone(), label)),
            ComponentShape::EmbeddedJob(job) => Arc::new(JobWorkUnit::new(job.clone(), label)),
            ComponentShape::Opaque(raw) => Arc::new(ProxyWorkUnit::new(raw.clone(), label)),
            ComponentShape::Unrecognized => {
                warn!(
                    component = %name,
                    produced = children.len(),
                    "Unreadable pipeline component"
                );
                return Resolution::new(children, true);
            }
        };
        children.push(child);
    }
    Resolution::new(children, false)
}

/// Builds work units from records, loading them from a store.
#[derive(Clone)]
pub struct WorkUnitResolver {
    store: Arc<dyn RecordStore>,
}

impl std::fmt::Debug for WorkUnitResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkUnitResolver").finish_non_exhaustive()
    }
}

impl WorkUnitResolver {
    /// Creates a resolver backed by `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Loads the record `uuid` and wraps it.
    ///
    /// Returns `None` if the record does not exist or is not readable.
    ///
    /// # Errors
    ///
    /// Returns the store's error unchanged.
    pub fn load(&self, uuid: &str) -> Result<Option<WorkUnitRef>, StoreError> {
        let record = self.store.fetch(uuid)?;
        if record.is_none() {
            debug!(uuid, "Record not readable");
        }
        Ok(record.map(|r| self.work_unit_for(r, None)))
    }

    /// Wraps `record` in the variant matching the kind of its UUID.
    #[must_use]
    pub fn work_unit_for(&self, record: Snapshot, label: Option<String>) -> WorkUnitRef {
        match get_str(&record, "uuid").and_then(ResourceKind::for_uuid) {
            Some(ResourceKind::Job) => Arc::new(JobWorkUnit::new(record, label)),
            Some(ResourceKind::PipelineInstance) => Arc::new(self.pipeline_instance(record, label)),
            _ => Arc::new(ProxyWorkUnit::new(record, label)),
        }
    }

    /// Wraps `record` as a pipeline instance whose children come from this
    /// resolver's store.
    #[must_use]
    pub fn pipeline_instance(
        &self,
        record: Snapshot,
        label: Option<String>,
    ) -> PipelineInstanceWorkUnit {
        PipelineInstanceWorkUnit::new(record, label, Arc::clone(&self.store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work_unit::WorkUnitVariant;
    use serde_json::json;

    fn snapshot(value: Value) -> Snapshot {
        value.as_object().cloned().unwrap()
    }

    fn index_with(uuid: &str, state: &str) -> JobIndex {
        let mut index = JobIndex::new();
        index.insert(uuid.to_string(), snapshot(json!({"uuid": uuid, "state": state})));
        index
    }

    #[test]
    fn test_classify_decision_table() {
        let index = index_with("zzzzz-8i9sb-000000000000001", "Complete");

        let live = json!({"job": {"uuid": "zzzzz-8i9sb-000000000000001", "state": "Queued"}});
        assert!(matches!(
            classify(&live, &index),
            ComponentShape::LiveJob(r) if get_str(r, "state") == Some("Complete")
        ));

        let missing = json!({"job": {"uuid": "zzzzz-8i9sb-000000000000009", "state": "Queued"}});
        assert!(matches!(classify(&missing, &index), ComponentShape::EmbeddedJob(_)));

        let embedded = json!({"job": {"state": "Queued"}});
        assert!(matches!(classify(&embedded, &index), ComponentShape::EmbeddedJob(_)));

        let opaque = json!({"script": "hash"});
        assert!(matches!(classify(&opaque, &index), ComponentShape::Opaque(_)));

        let null_job = json!({"job": null});
        assert!(matches!(classify(&null_job, &index), ComponentShape::Opaque(_)));

        assert_eq!(classify(&json!("hidden"), &index), ComponentShape::Unrecognized);
        assert_eq!(classify(&json!({"job": 7}), &index), ComponentShape::Unrecognized);
    }

    #[test]
    fn test_referenced_uuids_deduplicated_in_order() {
        let components = snapshot(json!({
            "b": {"job": {"uuid": "zzzzz-8i9sb-000000000000002"}},
            "a": {"job": {"uuid": "zzzzz-8i9sb-000000000000001"}},
            "c": {"job": {"uuid": "zzzzz-8i9sb-000000000000002"}},
            "d": {"job": {"state": "New"}},
            "e": "opaque",
        }));

        assert_eq!(
            referenced_job_uuids(&components),
            vec!["zzzzz-8i9sb-000000000000002", "zzzzz-8i9sb-000000000000001"]
        );
    }

    #[test]
    fn test_non_map_components_are_unreadable() {
        let resolution = resolve_components(Some(&json!(["x"])), &JobIndex::new());
        assert!(resolution.children.is_empty());
        assert!(resolution.unreadable_children);

        let resolution = resolve_components(None, &JobIndex::new());
        assert!(resolution.children.is_empty());
        assert!(!resolution.unreadable_children);
    }

    #[test]
    fn test_work_unit_for_picks_variant_by_kind() {
        let resolver = WorkUnitResolver::new(Arc::new(crate::store::MemoryStore::new()));

        let job =
            resolver.work_unit_for(snapshot(json!({"uuid": "zzzzz-8i9sb-000000000000001"})), None);
        assert_eq!(job.variant(), WorkUnitVariant::Job);

        let pipeline =
            resolver.work_unit_for(snapshot(json!({"uuid": "zzzzz-d1hrv-000000000000001"})), None);
        assert_eq!(pipeline.variant(), WorkUnitVariant::PipelineInstance);

        let other =
            resolver.work_unit_for(snapshot(json!({"uuid": "zzzzz-xvhdp-000000000000001"})), None);
        assert_eq!(other.variant(), WorkUnitVariant::Proxy);

        let anonymous = resolver.work_unit_for(snapshot(json!({"state": "Running"})), None);
        assert_eq!(anonymous.variant(), WorkUnitVariant::Proxy);
    }
}
