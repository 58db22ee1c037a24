//! Work units backed by job records.

use super::{WorkUnit, WorkUnitVariant};
use crate::core::{get_count, get_map, Snapshot};
use crate::errors::StoreError;

/// Task counters reported in a job's `tasks_summary`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    /// Tasks finished successfully.
    pub done: u64,
    /// Tasks that failed.
    pub failed: u64,
    /// Tasks in progress.
    pub running: u64,
    /// Tasks not yet started.
    pub todo: u64,
}

impl TaskCounts {
    /// Reads the counters from a job snapshot. Missing or negative counters
    /// read as zero.
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        get_map(snapshot, "tasks_summary").map_or_else(Self::default, |summary| Self {
            done: get_count(summary, "done"),
            failed: get_count(summary, "failed"),
            running: get_count(summary, "running"),
            todo: get_count(summary, "todo"),
        })
    }

    /// Total number of tasks.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.done + self.failed + self.running + self.todo
    }

    /// Fraction of tasks that have finished, either way.
    #[must_use]
    pub fn finished_ratio(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => (self.done + self.failed) as f64 / total as f64,
        }
    }
}

/// A work unit over a job record.
///
/// The snapshot is either the live record from the store or, when the
/// record could not be fetched, the copy embedded in the parent pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct JobWorkUnit {
    snapshot: Snapshot,
    label: Option<String>,
}

impl JobWorkUnit {
    /// Creates a job work unit over `snapshot`.
    #[must_use]
    pub fn new(snapshot: Snapshot, label: Option<String>) -> Self {
        Self { snapshot, label }
    }

    /// Returns the job's task counters.
    #[must_use]
    pub fn task_counts(&self) -> TaskCounts {
        TaskCounts::from_snapshot(&self.snapshot)
    }
}

impl WorkUnit for JobWorkUnit {
    fn variant(&self) -> WorkUnitVariant {
        WorkUnitVariant::Job
    }

    fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn progress(&self) -> Result<f64, StoreError> {
        if self.run_state().is_some_and(|s| s.is_terminal()) {
            return Ok(1.0);
        }
        Ok(self.task_counts().finished_ratio())
    }

    fn title(&self) -> &'static str {
        "job"
    }
}
