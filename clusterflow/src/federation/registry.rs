//! Where remote clusters live.

use std::collections::HashMap;

use super::FederationConfig;

/// Maps a cluster id to the base URL of its API.
///
/// An unknown cluster is an ordinary answer (`None`), not an error.
pub trait RemoteClusterRegistry: Send + Sync {
    /// Returns the base URL for `cluster_id`, without a trailing slash.
    fn base_url(&self, cluster_id: &str) -> Option<String>;
}

/// A registry with a fixed set of clusters.
#[derive(Debug, Clone, Default)]
pub struct StaticClusterRegistry {
    hosts: HashMap<String, String>,
}

impl StaticClusterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry from the configured remote hosts.
    #[must_use]
    pub fn from_config(config: &FederationConfig) -> Self {
        config
            .remote_hosts
            .iter()
            .fold(Self::new(), |registry, (id, host)| registry.with_host(id, host))
    }

    /// Registers `host` for `cluster_id`. A host without a scheme is
    /// reached over HTTPS.
    #[must_use]
    pub fn with_host(mut self, cluster_id: impl Into<String>, host: impl AsRef<str>) -> Self {
        self.hosts.insert(cluster_id.into(), normalize_base_url(host.as_ref()));
        self
    }

    /// Returns the number of registered clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Returns true if no cluster is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl RemoteClusterRegistry for StaticClusterRegistry {
    fn base_url(&self, cluster_id: &str) -> Option<String> {
        self.hosts.get(cluster_id).cloned()
    }
}

/// Turns a configured host into a base URL.
#[must_use]
pub fn normalize_base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("zbbbb.example.com"), "https://zbbbb.example.com");
        assert_eq!(normalize_base_url("http://localhost:3001/"), "http://localhost:3001");
        assert_eq!(normalize_base_url(" https://a.example "), "https://a.example");
    }

    #[test]
    fn test_registry_from_config() {
        let config = FederationConfig::new("zhome")
            .with_remote("zbbbb", "zbbbb.example.com")
            .with_remote("zcccc", "http://127.0.0.1:9000");
        let registry = StaticClusterRegistry::from_config(&config);

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.base_url("zbbbb").as_deref(),
            Some("https://zbbbb.example.com")
        );
        assert_eq!(registry.base_url("zcccc").as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(registry.base_url("zdddd"), None);
    }
}
