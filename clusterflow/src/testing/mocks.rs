//! Scripted collaborators for authentication tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

use crate::federation::{
    parse_identity_response, IdentityVerifier, RemoteIdentity, VerificationError,
    VerificationRequest,
};

/// What a [`StubVerifier`] answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubResponse {
    /// A 200 response carrying this identity.
    Identity(RemoteIdentity),
    /// A raw HTTP response, interpreted like a real one.
    Http {
        /// The status code.
        status: u16,
        /// The body.
        body: String,
    },
    /// The connection fails.
    Transport,
    /// The remote never answers.
    Hang,
}

impl StubResponse {
    /// A 200 response for an active, non-admin user.
    #[must_use]
    pub fn user(uuid: impl Into<String>) -> Self {
        Self::Identity(RemoteIdentity {
            uuid: uuid.into(),
            is_admin: false,
            is_active: true,
            expires_at: None,
        })
    }

    /// A raw HTTP response.
    #[must_use]
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }
}

/// An [`IdentityVerifier`] that answers from a script and records calls.
#[derive(Debug)]
pub struct StubVerifier {
    response: Mutex<StubResponse>,
    delay: Mutex<Option<Duration>>,
    requests: Mutex<Vec<VerificationRequest>>,
}

impl StubVerifier {
    /// Creates a stub that always gives `response`.
    #[must_use]
    pub fn new(response: StubResponse) -> Self {
        Self {
            response: Mutex::new(response),
            delay: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a stub that vouches for `uuid`.
    #[must_use]
    pub fn accepting(uuid: impl Into<String>) -> Self {
        Self::new(StubResponse::user(uuid))
    }

    /// Delays every answer.
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock() = Some(delay);
        self
    }

    /// Replaces the scripted response.
    pub fn set_response(&self, response: StubResponse) {
        *self.response.lock() = response;
    }

    /// Number of verification calls received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// The requests received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<VerificationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl IdentityVerifier for StubVerifier {
    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<RemoteIdentity, VerificationError> {
        self.requests.lock().push(request.clone());
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let response = self.response.lock().clone();
        match response {
            StubResponse::Identity(identity) => Ok(identity),
            StubResponse::Http { status, body } => parse_identity_response(status, &body),
            StubResponse::Transport => Err(VerificationError::Transport(
                "connection refused".to_string(),
            )),
            StubResponse::Hang => std::future::pending().await,
        }
    }
}
