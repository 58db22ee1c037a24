//! Testing utilities for clusterflow.
//!
//! This module provides:
//! - Record fixtures and builders
//! - A scripted identity verifier

mod fixtures;
mod mocks;

pub use fixtures::{fixture_uuid, job_component, snapshot, RecordBuilder, FIXTURE_CLUSTER};
pub use mocks::{StubResponse, StubVerifier};
