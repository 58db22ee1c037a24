//! Asking a remote cluster who a token belongs to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::errors::RejectionReason;

/// Path of the identity endpoint, relative to a cluster's base URL.
pub const IDENTITY_PATH: &str = "/arvados/v1/users/current";

/// The identity a remote cluster reports for a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIdentity {
    /// The user's UUID on the remote cluster.
    pub uuid: String,
    /// Whether the remote cluster considers the user an admin.
    pub is_admin: bool,
    /// Whether the user is active on the remote cluster.
    pub is_active: bool,
    /// When the remote cluster will stop honoring the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// One validation call.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    /// The remote cluster's base URL.
    pub base_url: String,
    /// The cluster asking.
    pub local_cluster_id: String,
    /// The salted token, `v2/<uuid>/<salted secret>`.
    pub bearer: String,
}

impl VerificationRequest {
    /// The full identity endpoint URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "{}{IDENTITY_PATH}?remote={}",
            self.base_url.trim_end_matches('/'),
            self.local_cluster_id
        )
    }
}

impl fmt::Debug for VerificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationRequest")
            .field("base_url", &self.base_url)
            .field("local_cluster_id", &self.local_cluster_id)
            .field("bearer", &"<redacted>")
            .finish()
    }
}

/// Why a validation call did not produce an identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// The remote answered with a non-success status.
    #[error("remote returned status {status}")]
    Rejected {
        /// The HTTP status.
        status: u16,
    },
    /// The remote answered with something that is not an identity.
    #[error("malformed identity response: {0}")]
    Malformed(String),
    /// The remote could not be reached.
    #[error("transport error: {0}")]
    Transport(String),
    /// The remote did not answer in time.
    #[error("timed out")]
    Timeout,
}

impl VerificationError {
    /// Only transport failures are worth another attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// The rejection reason this error amounts to.
    #[must_use]
    pub fn rejection_reason(&self) -> RejectionReason {
        match self {
            Self::Rejected { status } => RejectionReason::RemoteRejected { status: *status },
            Self::Malformed(_) => RejectionReason::MalformedResponse,
            Self::Transport(_) => RejectionReason::Transport,
            Self::Timeout => RejectionReason::Timeout,
        }
    }
}

/// Validates salted tokens against their issuing cluster.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Asks the remote cluster who `request.bearer` belongs to.
    async fn verify(&self, request: &VerificationRequest)
        -> Result<RemoteIdentity, VerificationError>;
}

/// Interprets an identity endpoint response.
///
/// Anything but a 2xx status with a JSON identity object is a rejection;
/// HTML error pages and truncated bodies included.
///
/// # Errors
///
/// Returns [`VerificationError::Rejected`] for non-success statuses and
/// [`VerificationError::Malformed`] for bodies that are not identities.
pub fn parse_identity_response(
    status: u16,
    body: &str,
) -> Result<RemoteIdentity, VerificationError> {
    if !(200..300).contains(&status) {
        return Err(VerificationError::Rejected { status });
    }
    serde_json::from_str(body).map_err(|e| VerificationError::Malformed(e.to_string()))
}

#[cfg(feature = "http")]
pub use http::HttpIdentityVerifier;

#[cfg(feature = "http")]
mod http {
    use async_trait::async_trait;
    use reqwest::Client;

    use super::{
        parse_identity_response, IdentityVerifier, RemoteIdentity, VerificationError,
        VerificationRequest,
    };
    use crate::errors::ConfigError;
    use crate::federation::FederationConfig;
    use crate::utils::{run_with_retry, RetryPolicy};

    /// Validates tokens over HTTP(S).
    #[derive(Debug, Clone)]
    pub struct HttpIdentityVerifier {
        client: Client,
        retry: RetryPolicy,
    }

    impl HttpIdentityVerifier {
        /// Builds a verifier with the configured timeout, TLS and retry
        /// settings.
        ///
        /// # Errors
        ///
        /// Returns [`ConfigError::Invalid`] if the HTTP client cannot be built.
        pub fn new(config: &FederationConfig) -> Result<Self, ConfigError> {
            let client = Client::builder()
                .timeout(config.request_timeout())
                .danger_accept_invalid_certs(config.accept_invalid_certs)
                .build()
                .map_err(|e| ConfigError::Invalid(format!("HTTP client: {e}")))?;
            Ok(Self::with_client(client, config.transport_retry.clone()))
        }

        /// Uses a preconfigured client.
        #[must_use]
        pub fn with_client(client: Client, retry: RetryPolicy) -> Self {
            Self { client, retry }
        }

        async fn send_once(
            &self,
            request: &VerificationRequest,
        ) -> Result<RemoteIdentity, VerificationError> {
            let response = self
                .client
                .get(request.url())
                .bearer_auth(&request.bearer)
                .send()
                .await
                .map_err(transport_error)?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(transport_error)?;
            parse_identity_response(status, &body)
        }
    }

    fn transport_error(err: reqwest::Error) -> VerificationError {
        if err.is_timeout() {
            VerificationError::Timeout
        } else {
            VerificationError::Transport(err.without_url().to_string())
        }
    }

    #[async_trait]
    impl IdentityVerifier for HttpIdentityVerifier {
        async fn verify(
            &self,
            request: &VerificationRequest,
        ) -> Result<RemoteIdentity, VerificationError> {
            run_with_retry(
                &self.retry,
                || self.send_once(request),
                VerificationError::is_retryable,
            )
            .await
        }
    }
}
