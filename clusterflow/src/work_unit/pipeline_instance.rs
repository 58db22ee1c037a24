//! Pipeline instances and their memoized children.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

use super::progress::ProgressTally;
use super::resolver::{fetch_job_index, resolve_components, Resolution};
use super::{Children, WorkUnit, WorkUnitVariant};
use crate::core::{get_map, RunState, Snapshot};
use crate::errors::StoreError;
use crate::store::RecordStore;

/// A proxy over a pipeline instance record that expands its `components`
/// map into child work units.
///
/// Children are resolved at most once per instance. The lock is held for
/// the whole resolution, so concurrent callers wait for the first one and
/// share its result. A store error is returned to the caller and leaves the
/// instance unresolved.
pub struct PipelineInstanceWorkUnit {
    snapshot: Snapshot,
    label: Option<String>,
    store: Arc<dyn RecordStore>,
    resolution: Mutex<Option<Resolution>>,
}

impl PipelineInstanceWorkUnit {
    /// Creates a pipeline work unit whose jobs are fetched from `store`.
    #[must_use]
    pub fn new(snapshot: Snapshot, label: Option<String>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            snapshot,
            label,
            store,
            resolution: Mutex::new(None),
        }
    }

    /// Returns the raw components map, if the record has one.
    #[must_use]
    pub fn components(&self) -> Option<&Snapshot> {
        get_map(&self.snapshot, "components")
    }

    /// Returns true once children have been resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolution.lock().is_some()
    }

    fn resolve(&self) -> Result<Resolution, StoreError> {
        let mut slot = self.resolution.lock();
        if let Some(resolution) = slot.as_ref() {
            return Ok(resolution.clone());
        }

        let index = match self.components() {
            Some(components) => fetch_job_index(self.store.as_ref(), components)?,
            None => Default::default(),
        };
        let resolution = resolve_components(self.snapshot.get("components"), &index);
        tracing::debug!(
            uuid = self.uuid().unwrap_or_default(),
            children = resolution.children.len(),
            unreadable = resolution.unreadable_children,
            "Resolved pipeline children"
        );
        *slot = Some(resolution.clone());
        Ok(resolution)
    }
}

impl fmt::Debug for PipelineInstanceWorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineInstanceWorkUnit")
            .field("uuid", &self.uuid())
            .field("label", &self.label)
            .field("resolved", &self.is_resolved())
            .finish_non_exhaustive()
    }
}

impl WorkUnit for PipelineInstanceWorkUnit {
    fn variant(&self) -> WorkUnitVariant {
        WorkUnitVariant::PipelineInstance
    }

    fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// A `Complete` instance is done regardless of what its children say.
    fn progress(&self) -> Result<f64, StoreError> {
        if self.run_state() == Some(RunState::Complete) {
            return Ok(1.0);
        }
        let children = self.children()?;
        Ok(ProgressTally::from_units(&children).ratio())
    }

    fn children(&self) -> Result<Children, StoreError> {
        Ok(self.resolve()?.children)
    }

    fn has_unreadable_children(&self) -> bool {
        self.resolution
            .lock()
            .as_ref()
            .is_some_and(|r| r.unreadable_children)
    }

    fn title(&self) -> &'static str {
        "pipeline"
    }
}
