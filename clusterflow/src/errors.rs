//! Error types for clusterflow.
//!
//! Partial visibility is not an error here: an unreadable child is a flag
//! on the work unit.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::core::ResourceKind;

/// Convenience alias for results carrying a [`ClusterflowError`].
pub type Result<T> = std::result::Result<T, ClusterflowError>;

/// The main error type for clusterflow operations.
#[derive(Debug, Error)]
pub enum ClusterflowError {
    /// The data layer failed.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// A supplied kind does not match the kind inferred from a UUID.
    #[error("{0}")]
    KindMismatch(#[from] KindMismatchError),

    /// Authentication was rejected.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ClusterflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors raised by a record store.
///
/// These propagate to the caller untouched; retry policy belongs to the
/// store implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("Data store unavailable: {0}")]
    Unavailable(String),

    /// The query could not be evaluated.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Any other store failure.
    #[error("Data store error: {0}")]
    Internal(String),
}

/// A user-facing error body: a list of messages and an HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable messages.
    pub errors: Vec<String>,
    /// HTTP-equivalent status code.
    #[serde(skip)]
    pub status: u16,
}

impl ErrorPayload {
    /// Creates a payload with a single message.
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
            status,
        }
    }

    /// Renders the body as JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "errors": self.errors })
    }
}

fn kind_label(kind: &Option<ResourceKind>) -> String {
    kind.map(|k| k.to_string()).unwrap_or_default()
}

/// Raised when a link's supplied `head_kind`/`tail_kind` disagrees with the
/// kind inferred from the matching UUID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{supplied}' does not match uuid '{uuid}', expected '{}'", kind_label(.actual))]
pub struct KindMismatchError {
    /// The attribute that carried the kind, e.g. `head_kind`.
    pub attribute: String,
    /// The kind as supplied by the caller.
    pub supplied: String,
    /// The UUID the kind was checked against.
    pub uuid: String,
    /// The kind inferred from the UUID, if any.
    pub actual: Option<ResourceKind>,
}

impl KindMismatchError {
    /// Creates a new kind mismatch error.
    #[must_use]
    pub fn new(
        attribute: impl Into<String>,
        supplied: impl Into<String>,
        uuid: impl Into<String>,
        actual: Option<ResourceKind>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            supplied: supplied.into(),
            uuid: uuid.into(),
            actual,
        }
    }

    /// HTTP-equivalent status: unprocessable entity.
    #[must_use]
    pub const fn status(&self) -> u16 {
        422
    }

    /// Converts to a user-facing payload.
    #[must_use]
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload::new(self.status(), self.to_string())
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!("KindMismatch"));
        map.insert("attribute".to_string(), serde_json::json!(self.attribute));
        map.insert("supplied".to_string(), serde_json::json!(self.supplied));
        map.insert("uuid".to_string(), serde_json::json!(self.uuid));
        map.insert("actual".to_string(), serde_json::json!(kind_label(&self.actual)));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Why a remote token was not accepted.
///
/// Only ever logged or inspected by diagnostics; callers see a single
/// "unauthorized" outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The token did not have the expected structure.
    MalformedToken,
    /// No endpoint is registered for the token's cluster.
    UnknownCluster {
        /// The cluster id taken from the token.
        cluster_id: String,
    },
    /// The remote cluster answered with a non-success status.
    RemoteRejected {
        /// The HTTP status returned.
        status: u16,
    },
    /// The remote cluster answered with something other than an identity.
    MalformedResponse,
    /// The remote cluster could not be reached.
    Transport,
    /// The remote cluster did not answer in time.
    Timeout,
    /// The remote cluster vouched for a user it does not own.
    IdentityClusterMismatch {
        /// The cluster that issued the token.
        cluster_id: String,
        /// The user UUID the remote returned.
        user_uuid: String,
    },
    /// The remote identity's claimed lifetime has already ended.
    Expired,
    /// The token's secret is not the one salted for the requesting cluster.
    InvalidSalt,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedToken => write!(f, "malformed token"),
            Self::UnknownCluster { cluster_id } => {
                write!(f, "no endpoint registered for cluster {cluster_id}")
            }
            Self::RemoteRejected { status } => write!(f, "remote cluster returned status {status}"),
            Self::MalformedResponse => write!(f, "remote cluster returned a malformed identity"),
            Self::Transport => write!(f, "remote cluster unreachable"),
            Self::Timeout => write!(f, "remote cluster timed out"),
            Self::IdentityClusterMismatch {
                cluster_id,
                user_uuid,
            } => write!(f, "cluster {cluster_id} vouched for foreign user {user_uuid}"),
            Self::Expired => write!(f, "remote identity expired"),
            Self::InvalidSalt => write!(f, "token not salted for requesting cluster"),
        }
    }
}

/// Authentication failed. Every failure mode looks the same from outside.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unauthorized")]
pub struct AuthError {
    /// Diagnostic detail. Never shown to the caller.
    pub reason: RejectionReason,
}

impl AuthError {
    /// Creates an authentication error.
    #[must_use]
    pub const fn new(reason: RejectionReason) -> Self {
        Self { reason }
    }

    /// HTTP-equivalent status.
    #[must_use]
    pub const fn status(&self) -> u16 {
        401
    }

    /// Converts to a user-facing payload.
    #[must_use]
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload::new(self.status(), "Not logged in")
    }
}

impl From<RejectionReason> for AuthError {
    fn from(reason: RejectionReason) -> Self {
        Self::new(reason)
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The configuration source could not be read.
    #[error("Failed to read configuration: {0}")]
    Io(String),

    /// The configuration could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// A value is out of range or malformed.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mismatch_names_both_kinds() {
        let err = KindMismatchError::new(
            "head_kind",
            "Job",
            "zzzzz-4zz18-znfnqtbbv4spc3w",
            Some(ResourceKind::Collection),
        );

        assert_eq!(
            err.to_string(),
            "'Job' does not match uuid 'zzzzz-4zz18-znfnqtbbv4spc3w', expected 'arvados#collection'"
        );
        assert_eq!(err.status(), 422);
    }

    #[test]
    fn test_kind_mismatch_unknown_actual() {
        let err = KindMismatchError::new("tail_kind", "arvados#job", "bogus", None);
        assert!(err.to_string().ends_with("expected ''"));
    }

    #[test]
    fn test_kind_mismatch_payload() {
        let err = KindMismatchError::new(
            "head_kind",
            "Job",
            "zzzzz-4zz18-znfnqtbbv4spc3w",
            Some(ResourceKind::Collection),
        );
        let payload = err.to_payload();

        assert_eq!(payload.status, 422);
        assert_eq!(payload.errors.len(), 1);
        assert_eq!(payload.to_json()["errors"][0], serde_json::json!(err.to_string()));
        assert_eq!(err.to_dict().get("actual").unwrap(), "arvados#collection");
    }

    #[test]
    fn test_auth_error_hides_reason() {
        let err = AuthError::new(RejectionReason::RemoteRejected { status: 500 });
        assert_eq!(err.to_string(), "unauthorized");
        assert_eq!(err.status(), 401);
        assert_eq!(
            err.reason.to_string(),
            "remote cluster returned status 500"
        );
    }

    #[test]
    fn test_rejection_reason_serializes_tagged() {
        let json = serde_json::to_value(RejectionReason::UnknownCluster {
            cluster_id: "zbork".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"reason": "unknown_cluster", "cluster_id": "zbork"}));
    }

    #[test]
    fn test_wraps_into_clusterflow_error() {
        let err: ClusterflowError = StoreError::Unavailable("db down".into()).into();
        assert_eq!(err.to_string(), "Data store unavailable: db down");

        let err: ClusterflowError = ConfigError::Invalid("ttl".into()).into();
        assert!(matches!(err, ClusterflowError::Config(_)));
    }
}
