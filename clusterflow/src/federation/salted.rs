//! Checking salted tokens presented by other clusters.
//!
//! This is the other side of [`super::RemoteAuthResolver`]: a cluster that
//! issued a token receives it back from a cooperating cluster with the
//! secret salted for that cluster, and must confirm the salt.

use std::collections::HashMap;

use super::token::{parse_authorization, verify_salted_secret, PresentedToken};
use crate::errors::{AuthError, RejectionReason};

/// Looks up the raw secret of a locally issued token.
pub trait LocalTokenSource: Send + Sync {
    /// Returns the secret of token `token_uuid`, if it exists and is live.
    fn secret_for(&self, token_uuid: &str) -> Option<String>;
}

impl LocalTokenSource for HashMap<String, String> {
    fn secret_for(&self, token_uuid: &str) -> Option<String> {
        self.get(token_uuid).cloned()
    }
}

/// Confirms that `presented` carries the secret of a local token salted for
/// `requesting_cluster`, and returns the token's UUID.
///
/// # Errors
///
/// Returns [`AuthError`] with [`RejectionReason::MalformedToken`] if
/// `presented` is not a v2 token, or [`RejectionReason::InvalidSalt`] if the
/// token is unknown or salted for a different cluster.
pub fn validate_salted_token(
    source: &dyn LocalTokenSource,
    presented: &str,
    requesting_cluster: &str,
) -> Result<String, AuthError> {
    let PresentedToken::V2(token) = parse_authorization(presented) else {
        return Err(RejectionReason::MalformedToken.into());
    };
    let secret = source
        .secret_for(token.token_uuid())
        .ok_or(RejectionReason::InvalidSalt)?;
    if !verify_salted_secret(&secret, requesting_cluster, token.secret()) {
        tracing::warn!(
            token_uuid = token.token_uuid(),
            requesting_cluster,
            "Salted token does not match"
        );
        return Err(RejectionReason::InvalidSalt.into());
    }
    Ok(token.token_uuid().to_string())
}
