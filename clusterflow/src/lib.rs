//! # Clusterflow
//!
//! Status aggregation for pipeline execution trees, and authentication of
//! tokens issued by cooperating clusters.
//!
//! Clusterflow provides:
//!
//! - **Work units**: one interface over jobs, opaque components and pipeline
//!   instances, with lazily resolved and memoized children
//! - **Progress aggregation**: completion ratios that tolerate partial
//!   visibility
//! - **Federation**: salted remote tokens, remote identity validation with a
//!   bounded timeout, and an expiring positive/negative outcome cache
//! - **Links**: rewriting of legacy kind filters and create-time kind checks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use clusterflow::prelude::*;
//!
//! let resolver = WorkUnitResolver::new(store);
//! if let Some(unit) = resolver.load("zzzzz-d1hrv-1yfj6xkidf2muk3")? {
//!     println!("{} is {:.0}% done", unit.title(), unit.progress()? * 100.0);
//! }
//!
//! let auth = RemoteAuthResolver::from_config(FederationConfig::from_env()?)?;
//! match auth.authenticate(header).await? {
//!     AuthOutcome::Authenticated(identity) => println!("remote user {}", identity.uuid),
//!     AuthOutcome::Local => { /* local authentication applies */ }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cast_precision_loss
)]

pub mod core;
pub mod errors;
pub mod federation;
pub mod links;
pub mod observability;
pub mod store;
pub mod testing;
pub mod utils;
pub mod work_unit;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{ResourceKind, RunState, Snapshot};
    pub use crate::errors::{
        AuthError, ClusterflowError, ConfigError, ErrorPayload, KindMismatchError,
        RejectionReason, StoreError,
    };
    pub use crate::federation::{
        AuthCache, AuthOutcome, FederationConfig, IdentityVerifier, RemoteAuthResolver,
        RemoteClusterRegistry, ResolvedIdentity, StaticClusterRegistry,
    };
    pub use crate::links::{normalize_query, prepare_link_attributes};
    pub use crate::observability::{init_logging, LogFormat, LoggingConfig};
    pub use crate::store::{Filter, MemoryStore, RecordQuery, RecordStore};
    pub use crate::utils::{Clock, SystemClock, Timestamp};
    pub use crate::work_unit::{
        aggregate_progress, JobWorkUnit, PipelineInstanceWorkUnit, ProgressTally, ProxyWorkUnit,
        WorkUnit, WorkUnitRef, WorkUnitResolver, WorkUnitVariant,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
