//! Configuration for cross-cluster authentication.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::core::is_valid_cluster_id;
use crate::errors::ConfigError;
use crate::utils::RetryPolicy;

/// Largest value accepted for any of the duration settings: one year.
pub const MAX_DURATION_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Settings for authenticating tokens issued by other clusters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FederationConfig {
    /// This cluster's five-character id.
    #[serde(default = "default_local_cluster_id")]
    pub local_cluster_id: String,
    /// Remote cluster id to host or base URL.
    #[serde(default)]
    pub remote_hosts: BTreeMap<String, String>,
    /// How long an accepted remote identity is trusted, in seconds.
    #[serde(default = "default_remote_token_ttl")]
    pub remote_token_ttl_seconds: u64,
    /// How long a rejection is remembered, in seconds.
    #[serde(default = "default_rejection_ttl")]
    pub rejection_ttl_seconds: u64,
    /// Upper bound on one validation round trip, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Whether a remote cluster may grant admin rights here.
    #[serde(default)]
    pub trust_remote_admin: bool,
    /// Whether to skip TLS certificate verification for remote clusters.
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// Retry policy for transport failures. Rejections are never retried.
    #[serde(default)]
    pub transport_retry: RetryPolicy,
}

fn default_local_cluster_id() -> String {
    "zzzzz".to_string()
}

fn default_remote_token_ttl() -> u64 {
    300
}

fn default_rejection_ttl() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            local_cluster_id: default_local_cluster_id(),
            remote_hosts: BTreeMap::new(),
            remote_token_ttl_seconds: default_remote_token_ttl(),
            rejection_ttl_seconds: default_rejection_ttl(),
            request_timeout_seconds: default_request_timeout(),
            trust_remote_admin: false,
            accept_invalid_certs: false,
            transport_retry: RetryPolicy::default(),
        }
    }
}

impl FederationConfig {
    /// Creates a default configuration for `local_cluster_id`.
    #[must_use]
    pub fn new(local_cluster_id: impl Into<String>) -> Self {
        Self {
            local_cluster_id: local_cluster_id.into(),
            ..Self::default()
        }
    }

    /// Registers a remote cluster.
    #[must_use]
    pub fn with_remote(mut self, cluster_id: impl Into<String>, host: impl Into<String>) -> Self {
        self.remote_hosts.insert(cluster_id.into(), host.into());
        self
    }

    /// Sets the accepted-identity lifetime.
    #[must_use]
    pub fn with_remote_token_ttl(mut self, ttl: Duration) -> Self {
        self.remote_token_ttl_seconds = ttl.as_secs();
        self
    }

    /// Sets the rejection lifetime.
    #[must_use]
    pub fn with_rejection_ttl(mut self, ttl: Duration) -> Self {
        self.rejection_ttl_seconds = ttl.as_secs();
        self
    }

    /// Sets the validation timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_seconds = timeout.as_secs();
        self
    }

    /// Sets whether remote admin flags are honored.
    #[must_use]
    pub fn with_trust_remote_admin(mut self, trust: bool) -> Self {
        self.trust_remote_admin = trust;
        self
    }

    /// Sets the transport retry policy.
    #[must_use]
    pub fn with_transport_retry(mut self, policy: RetryPolicy) -> Self {
        self.transport_retry = policy;
        self
    }

    /// Accepted-identity lifetime.
    #[must_use]
    pub fn remote_token_ttl(&self) -> Duration {
        Duration::from_secs(self.remote_token_ttl_seconds)
    }

    /// Rejection lifetime.
    #[must_use]
    pub fn rejection_ttl(&self) -> Duration {
        Duration::from_secs(self.rejection_ttl_seconds)
    }

    /// Validation timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`FederationConfig::from_json_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Builds a configuration from `CLUSTERFLOW_*` environment variables.
    ///
    /// - `CLUSTERFLOW_LOCAL_CLUSTER_ID`
    /// - `CLUSTERFLOW_REMOTE_HOSTS` (`id=host,id=host`)
    /// - `CLUSTERFLOW_REMOTE_TOKEN_TTL` (seconds)
    /// - `CLUSTERFLOW_REJECTION_TTL` (seconds)
    /// - `CLUSTERFLOW_REQUEST_TIMEOUT` (seconds)
    /// - `CLUSTERFLOW_TRUST_REMOTE_ADMIN` (`true`/`false`)
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for unparseable or out-of-range
    /// values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`FederationConfig::from_env`], reading variables through
    /// `lookup`.
    ///
    /// # Errors
    ///
    /// As [`FederationConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(id) = lookup("CLUSTERFLOW_LOCAL_CLUSTER_ID") {
            config.local_cluster_id = id.trim().to_string();
        }
        if let Some(hosts) = lookup("CLUSTERFLOW_REMOTE_HOSTS") {
            config.remote_hosts = parse_remote_hosts(&hosts)?;
        }
        if let Some(v) = lookup("CLUSTERFLOW_REMOTE_TOKEN_TTL") {
            config.remote_token_ttl_seconds = parse_var("CLUSTERFLOW_REMOTE_TOKEN_TTL", &v)?;
        }
        if let Some(v) = lookup("CLUSTERFLOW_REJECTION_TTL") {
            config.rejection_ttl_seconds = parse_var("CLUSTERFLOW_REJECTION_TTL", &v)?;
        }
        if let Some(v) = lookup("CLUSTERFLOW_REQUEST_TIMEOUT") {
            config.request_timeout_seconds = parse_var("CLUSTERFLOW_REQUEST_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("CLUSTERFLOW_TRUST_REMOTE_ADMIN") {
            config.trust_remote_admin = parse_var("CLUSTERFLOW_TRUST_REMOTE_ADMIN", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks cluster ids, hosts and durations.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_cluster_id(&self.local_cluster_id) {
            return Err(ConfigError::Invalid(format!(
                "local_cluster_id '{}' is not a cluster id",
                self.local_cluster_id
            )));
        }
        for (cluster_id, host) in &self.remote_hosts {
            if !is_valid_cluster_id(cluster_id) {
                return Err(ConfigError::Invalid(format!(
                    "remote_hosts key '{cluster_id}' is not a cluster id"
                )));
            }
            if host.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "remote_hosts entry for '{cluster_id}' is empty"
                )));
            }
        }
        for (name, value) in [
            ("remote_token_ttl_seconds", self.remote_token_ttl_seconds),
            ("rejection_ttl_seconds", self.rejection_ttl_seconds),
            ("request_timeout_seconds", self.request_timeout_seconds),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
            if value > MAX_DURATION_SECONDS {
                return Err(ConfigError::Invalid(format!(
                    "{name} must not exceed {MAX_DURATION_SECONDS}"
                )));
            }
        }
        if self.transport_retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "transport_retry.max_attempts must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{name}: cannot parse '{value}'")))
}

fn parse_remote_hosts(value: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(id, host)| (id.trim().to_string(), host.trim().to_string()))
                .ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "CLUSTERFLOW_REMOTE_HOSTS: expected id=host, got '{entry}'"
                    ))
                })
        })
        .collect()
}
