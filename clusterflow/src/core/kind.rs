//! Resource kinds and the identifiers they are inferred from.
//!
//! Every record UUID has the shape `<cluster>-<infix>-<suffix>`, five, five
//! and fifteen lowercase alphanumerics. The infix names the record type.
//! Collections can also be addressed by portable data hash
//! (`<md5 hex>+<size>[+hints]`).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Length of the cluster prefix at the start of every UUID.
pub const CLUSTER_ID_LEN: usize = 5;

fn uuid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    PATTERN.get_or_init(|| {
        Regex::new(r"^([0-9a-z]{5})-([0-9a-z]{5})-([0-9a-z]{15})$").expect("static pattern")
    })
}

fn portable_data_hash_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    PATTERN.get_or_init(|| Regex::new(r"^[0-9a-f]{32}\+[0-9]+(\+\S+)*$").expect("static pattern"))
}

/// Returns true if `s` is a well-formed record UUID.
#[must_use]
pub fn is_valid_uuid(s: &str) -> bool {
    uuid_pattern().is_match(s)
}

/// Returns true if `s` is a portable data hash.
#[must_use]
pub fn is_portable_data_hash(s: &str) -> bool {
    portable_data_hash_pattern().is_match(s)
}

/// Returns the cluster id a UUID was issued by.
#[must_use]
pub fn cluster_prefix(uuid: &str) -> Option<&str> {
    if is_valid_uuid(uuid) {
        uuid.get(..CLUSTER_ID_LEN)
    } else {
        None
    }
}

/// Returns true if `s` looks like a cluster id.
#[must_use]
pub fn is_valid_cluster_id(s: &str) -> bool {
    s.len() == CLUSTER_ID_LEN && s.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

/// The type of record a UUID refers to.
///
/// Variant names match the record class names.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResourceKind {
    ApiClientAuthorization,
    AuthorizedKey,
    Collection,
    Container,
    ContainerRequest,
    Group,
    Human,
    Job,
    JobTask,
    KeepDisk,
    KeepService,
    Link,
    Log,
    Node,
    PipelineInstance,
    PipelineTemplate,
    Repository,
    Specimen,
    Trait,
    User,
    VirtualMachine,
    Workflow,
}

impl ResourceKind {
    /// Every known kind.
    pub const ALL: [Self; 22] = [
        Self::ApiClientAuthorization,
        Self::AuthorizedKey,
        Self::Collection,
        Self::Container,
        Self::ContainerRequest,
        Self::Group,
        Self::Human,
        Self::Job,
        Self::JobTask,
        Self::KeepDisk,
        Self::KeepService,
        Self::Link,
        Self::Log,
        Self::Node,
        Self::PipelineInstance,
        Self::PipelineTemplate,
        Self::Repository,
        Self::Specimen,
        Self::Trait,
        Self::User,
        Self::VirtualMachine,
        Self::Workflow,
    ];

    /// The UUID infix for this kind.
    #[must_use]
    pub const fn uuid_infix(self) -> &'static str {
        match self {
            Self::ApiClientAuthorization => "gj3su",
            Self::AuthorizedKey => "fngyi",
            Self::Collection => "4zz18",
            Self::Container => "dz642",
            Self::ContainerRequest => "xvhdp",
            Self::Group => "j7d0g",
            Self::Human => "7a9it",
            Self::Job => "8i9sb",
            Self::JobTask => "ot0gb",
            Self::KeepDisk => "penuu",
            Self::KeepService => "bi6l4",
            Self::Link => "o0j2j",
            Self::Log => "57u5n",
            Self::Node => "7ekkf",
            Self::PipelineInstance => "d1hrv",
            Self::PipelineTemplate => "p5p6p",
            Self::Repository => "s0uqq",
            Self::Specimen => "j58dm",
            Self::Trait => "q1cn2",
            Self::User => "tpzed",
            Self::VirtualMachine => "2x53u",
            Self::Workflow => "7fd4e",
        }
    }

    /// The class-style name, e.g. `PipelineInstance`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ApiClientAuthorization => "ApiClientAuthorization",
            Self::AuthorizedKey => "AuthorizedKey",
            Self::Collection => "Collection",
            Self::Container => "Container",
            Self::ContainerRequest => "ContainerRequest",
            Self::Group => "Group",
            Self::Human => "Human",
            Self::Job => "Job",
            Self::JobTask => "JobTask",
            Self::KeepDisk => "KeepDisk",
            Self::KeepService => "KeepService",
            Self::Link => "Link",
            Self::Log => "Log",
            Self::Node => "Node",
            Self::PipelineInstance => "PipelineInstance",
            Self::PipelineTemplate => "PipelineTemplate",
            Self::Repository => "Repository",
            Self::Specimen => "Specimen",
            Self::Trait => "Trait",
            Self::User => "User",
            Self::VirtualMachine => "VirtualMachine",
            Self::Workflow => "Workflow",
        }
    }

    /// The canonical kind string, e.g. `arvados#pipelineInstance`.
    #[must_use]
    pub fn as_kind_string(self) -> String {
        let name = self.name();
        let mut out = String::with_capacity(name.len() + 8);
        out.push_str("arvados#");
        let mut chars = name.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_lowercase());
        }
        out.extend(chars);
        out
    }

    /// The snake_case plural used in record paths, e.g. `pipeline_instances`.
    #[must_use]
    pub fn table_name(self) -> String {
        let mut snake = String::new();
        for (i, c) in self.name().chars().enumerate() {
            if c.is_ascii_uppercase() {
                if i > 0 {
                    snake.push('_');
                }
                snake.push(c.to_ascii_lowercase());
            } else {
                snake.push(c);
            }
        }
        match snake.strip_suffix('y') {
            Some(stem) => format!("{stem}ies"),
            None => format!("{snake}s"),
        }
    }

    /// Infers the kind of record `uuid` refers to.
    ///
    /// Returns `None` for malformed identifiers and unknown infixes.
    #[must_use]
    pub fn for_uuid(uuid: &str) -> Option<Self> {
        if is_portable_data_hash(uuid) {
            return Some(Self::Collection);
        }
        let captures = uuid_pattern().captures(uuid)?;
        let infix = captures.get(2)?.as_str();
        Self::ALL.into_iter().find(|k| k.uuid_infix() == infix)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_kind_string())
    }
}

/// Error returned when a kind string names no known kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown resource kind: {0}")]
pub struct UnknownKindError(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownKindError;

    /// Accepts `arvados#job`, `Job`, `job`, `pipeline_instance` and so on.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s.trim().strip_prefix("arvados#").unwrap_or_else(|| s.trim());
        let normalized: String = bare.chars().filter(|c| *c != '_').collect();
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| UnknownKindError(s.to_string()))
    }
}

impl TryFrom<String> for ResourceKind {
    type Error = UnknownKindError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceKind> for String {
    fn from(kind: ResourceKind) -> Self {
        kind.as_kind_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_for_uuid() {
        assert_eq!(
            ResourceKind::for_uuid("zzzzz-8i9sb-pshmckwoma9plh7"),
            Some(ResourceKind::Job)
        );
        assert_eq!(
            ResourceKind::for_uuid("zzzzz-d1hrv-1yfj6xkidf2muk3"),
            Some(ResourceKind::PipelineInstance)
        );
        assert_eq!(
            ResourceKind::for_uuid("zzzzz-4zz18-znfnqtbbv4spc3w"),
            Some(ResourceKind::Collection)
        );
    }

    #[test]
    fn test_kind_for_portable_data_hash() {
        assert_eq!(
            ResourceKind::for_uuid("fa7aeb5140e2848d39b416daeef4ffc5+45"),
            Some(ResourceKind::Collection)
        );
        assert_eq!(
            ResourceKind::for_uuid("fa7aeb5140e2848d39b416daeef4ffc5+45+K@zbbbb"),
            Some(ResourceKind::Collection)
        );
    }

    #[test]
    fn test_kind_for_unknown_or_malformed() {
        assert_eq!(ResourceKind::for_uuid("zzzzz-aaaaa-pshmckwoma9plh7"), None);
        assert_eq!(ResourceKind::for_uuid("not-a-uuid"), None);
        assert_eq!(ResourceKind::for_uuid(""), None);
    }

    #[test]
    fn test_kind_strings() {
        assert_eq!(ResourceKind::Job.to_string(), "arvados#job");
        assert_eq!(
            ResourceKind::PipelineInstance.to_string(),
            "arvados#pipelineInstance"
        );
    }

    #[test]
    fn test_table_names() {
        assert_eq!(ResourceKind::Job.table_name(), "jobs");
        assert_eq!(ResourceKind::PipelineInstance.table_name(), "pipeline_instances");
        assert_eq!(ResourceKind::Repository.table_name(), "repositories");
        assert_eq!(
            ResourceKind::ApiClientAuthorization.table_name(),
            "api_client_authorizations"
        );
    }

    #[test]
    fn test_parse_accepts_legacy_spellings() {
        for s in ["arvados#job", "Job", "job", "JOB"] {
            assert_eq!(s.parse::<ResourceKind>(), Ok(ResourceKind::Job), "{s}");
        }
        assert_eq!(
            "pipeline_instance".parse::<ResourceKind>(),
            Ok(ResourceKind::PipelineInstance)
        );
        assert_eq!(
            "arvados#pipelineInstance".parse::<ResourceKind>(),
            Ok(ResourceKind::PipelineInstance)
        );
        assert!("arvados#spaceship".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_infixes_are_unique() {
        let mut infixes: Vec<_> = ResourceKind::ALL.iter().map(|k| k.uuid_infix()).collect();
        infixes.sort_unstable();
        infixes.dedup();
        assert_eq!(infixes.len(), ResourceKind::ALL.len());
    }

    #[test]
    fn test_cluster_prefix() {
        assert_eq!(cluster_prefix("zbbbb-tpzed-000000000000000"), Some("zbbbb"));
        assert_eq!(cluster_prefix("zbbbb"), None);
        assert!(is_valid_cluster_id("z0000"));
        assert!(!is_valid_cluster_id("ZBBBB"));
        assert!(!is_valid_cluster_id("zbbb"));
    }

    #[test]
    fn test_serde_uses_kind_string() {
        let json = serde_json::to_string(&ResourceKind::Collection).unwrap();
        assert_eq!(json, r#""arvados#collection""#);
        let parsed: ResourceKind = serde_json::from_str(r#""Collection""#).unwrap();
        assert_eq!(parsed, ResourceKind::Collection);
    }
}
