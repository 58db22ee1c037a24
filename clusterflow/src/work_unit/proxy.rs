//! Work units backed only by a snapshot.

use super::{WorkUnit, WorkUnitVariant};
use crate::core::Snapshot;
use crate::errors::StoreError;

/// A work unit that knows nothing beyond the map it was built from.
///
/// Used for components whose record type is not modeled separately.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyWorkUnit {
    snapshot: Snapshot,
    label: Option<String>,
}

impl ProxyWorkUnit {
    /// Creates a proxy over `snapshot`.
    #[must_use]
    pub fn new(snapshot: Snapshot, label: Option<String>) -> Self {
        Self { snapshot, label }
    }

    /// Consumes the unit and returns its snapshot.
    #[must_use]
    pub fn into_snapshot(self) -> Snapshot {
        self.snapshot
    }
}

impl WorkUnit for ProxyWorkUnit {
    fn variant(&self) -> WorkUnitVariant {
        WorkUnitVariant::Proxy
    }

    fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// A proxy has no finer-grained information than "finished or not".
    fn progress(&self) -> Result<f64, StoreError> {
        Ok(match self.run_state() {
            Some(state) if state.is_terminal() => 1.0,
            _ => 0.0,
        })
    }

    fn title(&self) -> &'static str {
        "component"
    }
}
