//! Core domain model types.
//!
//! This module contains the types shared by every other module:
//! - Record snapshots and typed accessors
//! - Run states
//! - Resource kinds inferred from identifiers

pub mod kind;
mod snapshot;
mod state;

pub use kind::{cluster_prefix, is_valid_cluster_id, is_valid_uuid, ResourceKind, UnknownKindError};
pub use snapshot::{get_bool, get_count, get_map, get_str, get_timestamp, Snapshot};
pub use state::RunState;
