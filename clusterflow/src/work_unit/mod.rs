//! Uniform handles over the nodes of an execution tree.
//!
//! A pipeline instance expands into jobs, opaque components and, through
//! them, whatever else the data layer can show us. Every node is exposed as
//! a [`WorkUnit`] so status and progress can be computed without caring
//! which concrete record backs it:
//!
//! - [`JobWorkUnit`]: a job record, live or embedded
//! - [`ProxyWorkUnit`]: nothing but a snapshot map
//! - [`PipelineInstanceWorkUnit`]: a proxy that expands its components

mod job;
mod pipeline_instance;
pub mod progress;
mod proxy;
pub mod resolver;
mod work_unit_tests;

pub use job::{JobWorkUnit, TaskCounts};
pub use pipeline_instance::PipelineInstanceWorkUnit;
pub use progress::{aggregate_progress, ProgressTally};
pub use proxy::ProxyWorkUnit;
pub use resolver::{ComponentShape, JobIndex, Resolution, WorkUnitResolver};

use std::fmt;
use std::sync::Arc;

use crate::core::{get_bool, get_str, get_timestamp, ResourceKind, RunState, Snapshot};
use crate::errors::StoreError;
use crate::utils::Timestamp;

/// A shared, type-erased work unit.
pub type WorkUnitRef = Arc<dyn WorkUnit>;

/// An ordered, immutable child sequence.
pub type Children = Arc<[WorkUnitRef]>;

/// Which concrete variant backs a work unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkUnitVariant {
    /// A job record.
    Job,
    /// An opaque snapshot.
    Proxy,
    /// A pipeline instance that expands into components.
    PipelineInstance,
}

/// The capability set shared by every node of an execution tree.
pub trait WorkUnit: fmt::Debug + Send + Sync {
    /// Which variant this is.
    fn variant(&self) -> WorkUnitVariant;

    /// The record or embedded data this unit was built from.
    fn snapshot(&self) -> &Snapshot;

    /// The name this unit has in its parent's component map.
    fn label(&self) -> Option<&str>;

    /// The identifier of the backing record, if there is one.
    fn uuid(&self) -> Option<&str> {
        get_str(self.snapshot(), "uuid")
    }

    /// The raw state string.
    fn state(&self) -> Option<&str> {
        get_str(self.snapshot(), "state")
    }

    /// The state, if it is one we recognize.
    fn run_state(&self) -> Option<RunState> {
        self.state().and_then(RunState::parse)
    }

    /// `Some(true)` succeeded, `Some(false)` failed, `None` unknown or still
    /// running.
    fn success(&self) -> Option<bool> {
        snapshot_outcome(self.snapshot())
    }

    /// Completion ratio in `[0.0, 1.0]`.
    fn progress(&self) -> Result<f64, StoreError>;

    /// Child units in declaration order.
    fn children(&self) -> Result<Children, StoreError> {
        Ok(no_children())
    }

    /// True if the child enumeration is known to be incomplete.
    ///
    /// Only meaningful once [`WorkUnit::children`] has run.
    fn has_unreadable_children(&self) -> bool {
        false
    }

    /// When the unit started running.
    fn started_at(&self) -> Option<Timestamp> {
        get_timestamp(self.snapshot(), "started_at")
    }

    /// When the unit stopped running.
    fn finished_at(&self) -> Option<Timestamp> {
        get_timestamp(self.snapshot(), "finished_at")
    }

    /// A short noun for display.
    fn title(&self) -> &'static str;

    /// The path at which the backing record can be viewed.
    fn uri(&self) -> Option<String> {
        self.uuid().and_then(record_uri)
    }
}

pub(crate) fn no_children() -> Children {
    Arc::from(Vec::new())
}

/// Terminal states decide the outcome; otherwise fall back to an explicit
/// `success` flag.
pub(crate) fn snapshot_outcome(snapshot: &Snapshot) -> Option<bool> {
    match get_str(snapshot, "state").and_then(RunState::parse) {
        Some(state) if state.is_terminal() => state.outcome(),
        _ => get_bool(snapshot, "success"),
    }
}

/// Returns `/<table>/<uuid>` for identifiers of a known kind.
#[must_use]
pub fn record_uri(uuid: &str) -> Option<String> {
    ResourceKind::for_uuid(uuid).map(|kind| format!("/{}/{uuid}", kind.table_name()))
}
