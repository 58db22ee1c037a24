//! Authenticating requests that carry another cluster's token.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cache::{AuthCache, CachedOutcome};
use super::registry::RemoteClusterRegistry;
use super::token::{parse_authorization, PresentedToken, RemoteToken};
use super::verifier::{IdentityVerifier, RemoteIdentity, VerificationError, VerificationRequest};
use super::FederationConfig;
use crate::core::cluster_prefix;
use crate::errors::{AuthError, RejectionReason};
use crate::utils::{add_duration, parse_timestamp, Timestamp};

/// A remote user as this cluster will treat them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedIdentity {
    /// The user's UUID on their home cluster.
    pub uuid: String,
    /// Admin here. False unless remote admins are trusted.
    pub is_admin: bool,
    /// Whether the home cluster reports the user as active.
    pub is_active: bool,
    /// The user's home cluster.
    pub cluster_id: String,
    /// The UUID of the token that was presented.
    pub token_uuid: String,
    /// When this identity stops being trusted without re-validation.
    pub expires_at: Timestamp,
}

/// The result of authenticating an `Authorization` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Not a remote token; local authentication applies.
    Local,
    /// A remote cluster vouched for the token.
    Authenticated(ResolvedIdentity),
}

/// Resolves remote tokens to identities, caching outcomes.
///
/// The cache is written in the same future that performs the remote call.
/// If the caller drops that future before it completes, nothing is cached.
pub struct RemoteAuthResolver {
    config: FederationConfig,
    registry: Arc<dyn RemoteClusterRegistry>,
    verifier: Arc<dyn IdentityVerifier>,
    cache: Arc<AuthCache>,
}

impl RemoteAuthResolver {
    /// Creates a resolver from its collaborators.
    #[must_use]
    pub fn new(
        config: FederationConfig,
        registry: Arc<dyn RemoteClusterRegistry>,
        verifier: Arc<dyn IdentityVerifier>,
        cache: Arc<AuthCache>,
    ) -> Self {
        Self {
            config,
            registry,
            verifier,
            cache,
        }
    }

    /// Creates a resolver that talks HTTP to the configured clusters, on the
    /// system clock.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::ConfigError`] if the configuration is
    /// invalid or the HTTP client cannot be built.
    #[cfg(feature = "http")]
    pub fn from_config(config: FederationConfig) -> Result<Self, crate::errors::ConfigError> {
        config.validate()?;
        let registry = Arc::new(super::StaticClusterRegistry::from_config(&config));
        let verifier = Arc::new(super::HttpIdentityVerifier::new(&config)?);
        Ok(Self::new(config, registry, verifier, Arc::new(AuthCache::default())))
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &FederationConfig {
        &self.config
    }

    /// The outcome cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<AuthCache> {
        &self.cache
    }

    /// Authenticates an `Authorization` header value or bare token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] for every kind of failure; the reason is only
    /// for diagnostics.
    pub async fn authenticate(&self, authorization: &str) -> Result<AuthOutcome, AuthError> {
        let token = match parse_authorization(authorization) {
            PresentedToken::Plain => return Ok(AuthOutcome::Local),
            PresentedToken::Malformed => {
                debug!("Rejecting malformed v2 token");
                return Err(RejectionReason::MalformedToken.into());
            }
            PresentedToken::V2(token) => token,
        };
        if token.cluster_id() == self.config.local_cluster_id {
            return Ok(AuthOutcome::Local);
        }

        let remote = RemoteToken::derive(&token, &self.config.local_cluster_id);
        let key = remote.cache_key();
        match self.cache.get(&key) {
            Some(CachedOutcome::Accepted(identity)) => {
                debug!(token_uuid = remote.token_uuid(), "Remote token cache hit");
                return Ok(AuthOutcome::Authenticated(identity));
            }
            Some(CachedOutcome::Rejected(reason)) => {
                debug!(
                    token_uuid = remote.token_uuid(),
                    %reason,
                    "Remote token rejected from cache"
                );
                return Err(reason.into());
            }
            None => {}
        }

        let outcome = self.validate(&remote).await;
        match &outcome {
            Ok(identity) => {
                info!(
                    token_uuid = remote.token_uuid(),
                    user_uuid = %identity.uuid,
                    cluster_id = remote.cluster_id(),
                    "Accepted remote identity"
                );
                self.cache.insert(
                    key,
                    CachedOutcome::Accepted(identity.clone()),
                    identity.expires_at,
                );
            }
            Err(reason) => {
                warn!(
                    token_uuid = remote.token_uuid(),
                    cluster_id = remote.cluster_id(),
                    %reason,
                    "Rejected remote token"
                );
                self.cache.insert_for(
                    key,
                    CachedOutcome::Rejected(reason.clone()),
                    self.config.rejection_ttl(),
                );
            }
        }
        outcome
            .map(AuthOutcome::Authenticated)
            .map_err(AuthError::from)
    }

    async fn validate(&self, remote: &RemoteToken) -> Result<ResolvedIdentity, RejectionReason> {
        let cluster_id = remote.cluster_id();
        let base_url = self
            .registry
            .base_url(cluster_id)
            .ok_or_else(|| RejectionReason::UnknownCluster {
                cluster_id: cluster_id.to_string(),
            })?;

        let request = VerificationRequest {
            base_url,
            local_cluster_id: self.config.local_cluster_id.clone(),
            bearer: remote.bearer(),
        };
        debug!(token_uuid = remote.token_uuid(), url = %request.url(), "Validating remote token");

        let identity = tokio::time::timeout(
            self.config.request_timeout(),
            self.verifier.verify(&request),
        )
        .await
        .unwrap_or(Err(VerificationError::Timeout))
        .map_err(|e| e.rejection_reason())?;

        self.evaluate(remote, identity)
    }

    fn evaluate(
        &self,
        remote: &RemoteToken,
        identity: RemoteIdentity,
    ) -> Result<ResolvedIdentity, RejectionReason> {
        if cluster_prefix(&identity.uuid) != Some(remote.cluster_id()) {
            return Err(RejectionReason::IdentityClusterMismatch {
                cluster_id: remote.cluster_id().to_string(),
                user_uuid: identity.uuid,
            });
        }

        let now = self.cache.now();
        let mut expires_at = add_duration(now, self.config.remote_token_ttl());
        if let Some(claimed) = identity.expires_at.as_deref() {
            let claimed =
                parse_timestamp(claimed).map_err(|_| RejectionReason::MalformedResponse)?;
            if claimed <= now {
                return Err(RejectionReason::Expired);
            }
            expires_at = expires_at.min(claimed);
        }

        Ok(ResolvedIdentity {
            uuid: identity.uuid,
            is_admin: self.config.trust_remote_admin && identity.is_admin,
            is_active: identity.is_active,
            cluster_id: remote.cluster_id().to_string(),
            token_uuid: remote.token_uuid().to_string(),
            expires_at,
        })
    }
}

impl fmt::Debug for RemoteAuthResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteAuthResolver")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
