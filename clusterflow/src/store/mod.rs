//! The data-layer collaborator.
//!
//! Storage itself lives elsewhere; this module defines the operations the
//! rest of the crate needs from it and an in-memory implementation used by
//! tests and embedders.

mod memory;
mod query;

pub use memory::MemoryStore;
pub use query::{Filter, RecordQuery};

use crate::core::Snapshot;
use crate::errors::StoreError;

/// Record access scoped to the current identity.
///
/// Implementations only ever return records the current identity may read;
/// unreadable records are indistinguishable from missing ones.
#[cfg_attr(test, mockall::automock)]
pub trait RecordStore: Send + Sync {
    /// Fetches every readable record whose UUID is in `uuids`, in one round
    /// trip. Never scans beyond the given UUIDs.
    fn fetch_many(&self, uuids: &[String]) -> Result<Vec<Snapshot>, StoreError>;

    /// Fetches one readable record.
    fn fetch(&self, uuid: &str) -> Result<Option<Snapshot>, StoreError>;

    /// Lists readable records matching `query`.
    fn list(&self, query: &RecordQuery) -> Result<Vec<Snapshot>, StoreError>;
}
