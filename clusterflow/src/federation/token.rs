//! Bearer tokens and their cluster-scoped salted form.
//!
//! A v2 token reads `v2/<token uuid>/<secret>`. The first five characters
//! of the token UUID name the cluster that issued it. Before a token is
//! shown to its issuing cluster, its secret is replaced with
//! `hex(HMAC-SHA256(secret, local cluster id))`, so the remote never sees
//! the raw secret and a salted token is only good for one requesting
//! cluster.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

use crate::core::{cluster_prefix, is_valid_uuid};

type HmacSha256 = Hmac<Sha256>;

const V2_PREFIX: &str = "v2/";
const SALTED_SECRET_LEN: usize = 64;

/// A v2 bearer token as presented by a client.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
    token_uuid: String,
    secret: String,
}

impl BearerToken {
    /// The token's UUID.
    #[must_use]
    pub fn token_uuid(&self) -> &str {
        &self.token_uuid
    }

    /// The cluster that issued the token.
    #[must_use]
    pub fn cluster_id(&self) -> &str {
        cluster_prefix(&self.token_uuid).unwrap_or_default()
    }

    /// The token's secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("token_uuid", &self.token_uuid)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// What an `Authorization` value turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentedToken {
    /// Not a v2 token; local authentication applies.
    Plain,
    /// A well-formed v2 token.
    V2(BearerToken),
    /// Starts like a v2 token but is not one.
    Malformed,
}

/// Parses an `Authorization` header value or a bare token.
///
/// Accepts `Bearer <token>`, `OAuth2 <token>` and `<token>`.
#[must_use]
pub fn parse_authorization(value: &str) -> PresentedToken {
    let value = value.trim();
    let token = ["Bearer ", "OAuth2 "]
        .iter()
        .find_map(|scheme| {
            value
                .get(..scheme.len())
                .filter(|head| head.eq_ignore_ascii_case(scheme))
                .map(|_| value[scheme.len()..].trim())
        })
        .unwrap_or(value);

    let Some(rest) = token.strip_prefix(V2_PREFIX) else {
        return PresentedToken::Plain;
    };
    match rest.split_once('/') {
        Some((uuid, secret))
            if is_valid_uuid(uuid) && !secret.is_empty() && !secret.contains('/') =>
        {
            PresentedToken::V2(BearerToken {
                token_uuid: uuid.to_string(),
                secret: secret.to_string(),
            })
        }
        _ => PresentedToken::Malformed,
    }
}

/// Returns true if `secret` already has the shape of a salted secret.
#[must_use]
pub fn is_salted(secret: &str) -> bool {
    secret.len() == SALTED_SECRET_LEN
        && secret.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Salts `secret` for use by `cluster_id`.
///
/// Secrets that are already salted are returned unchanged.
#[must_use]
pub fn salt_secret(secret: &str, cluster_id: &str) -> String {
    if is_salted(secret) {
        return secret.to_string();
    }
    hex::encode(salt_mac(secret, cluster_id).finalize().into_bytes())
}

/// Checks in constant time that `salted` is `secret` salted for
/// `cluster_id`.
#[must_use]
pub fn verify_salted_secret(secret: &str, cluster_id: &str, salted: &str) -> bool {
    match hex::decode(salted) {
        Ok(bytes) => salt_mac(secret, cluster_id).verify_slice(&bytes).is_ok(),
        Err(_) => false,
    }
}

fn salt_mac(secret: &str, cluster_id: &str) -> HmacSha256 {
    // HMAC accepts keys of any length.
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC key of any length");
    mac.update(cluster_id.as_bytes());
    mac
}

/// Cache key for a remote authentication outcome.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    salted_token: String,
    cluster_id: String,
}

impl CacheKey {
    /// Creates a key.
    #[must_use]
    pub fn new(salted_token: impl Into<String>, cluster_id: impl Into<String>) -> Self {
        Self {
            salted_token: salted_token.into(),
            cluster_id: cluster_id.into(),
        }
    }

    /// The remote cluster.
    #[must_use]
    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheKey")
            .field("cluster_id", &self.cluster_id)
            .finish_non_exhaustive()
    }
}

/// A remote token in the form this cluster shows to its issuer.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteToken {
    cluster_id: String,
    token_uuid: String,
    salted_secret: String,
}

impl RemoteToken {
    /// Salts `token` for presentation by `local_cluster_id`.
    #[must_use]
    pub fn derive(token: &BearerToken, local_cluster_id: &str) -> Self {
        Self {
            cluster_id: token.cluster_id().to_string(),
            token_uuid: token.token_uuid.clone(),
            salted_secret: salt_secret(&token.secret, local_cluster_id),
        }
    }

    /// The issuing cluster.
    #[must_use]
    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    /// The token's UUID.
    #[must_use]
    pub fn token_uuid(&self) -> &str {
        &self.token_uuid
    }

    /// The salted secret.
    #[must_use]
    pub fn salted_secret(&self) -> &str {
        &self.salted_secret
    }

    /// The full salted token, `v2/<uuid>/<salted secret>`.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("{V2_PREFIX}{}/{}", self.token_uuid, self.salted_secret)
    }

    /// The key under which this token's outcome is cached.
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.bearer(), self.cluster_id.clone())
    }
}

impl fmt::Debug for RemoteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteToken")
            .field("cluster_id", &self.cluster_id)
            .field("token_uuid", &self.token_uuid)
            .field("salted_secret", &"<redacted>")
            .finish()
    }
}
