//! Cross-cluster token authentication.
//!
//! A request may carry a token issued by a cooperating cluster. The flow is:
//!
//! 1. Parse the token and take the issuing cluster from its UUID prefix.
//! 2. Salt the secret for this cluster ([`RemoteToken`]).
//! 3. Reuse a live cached outcome if there is one ([`AuthCache`]).
//! 4. Otherwise ask the issuing cluster ([`IdentityVerifier`]) within a
//!    bounded timeout, and cache what it says, rejections included.
//!
//! Anything unexpected fails closed.

mod cache;
mod config;
mod registry;
mod resolver;
mod salted;
mod token;
mod verifier;


pub use cache::{AuthCache, CachedOutcome};
pub use config::FederationConfig;
pub use registry::{normalize_base_url, RemoteClusterRegistry, StaticClusterRegistry};
pub use resolver::{AuthOutcome, RemoteAuthResolver, ResolvedIdentity};
pub use salted::{validate_salted_token, LocalTokenSource};
pub use token::{
    is_salted, parse_authorization, salt_secret, verify_salted_secret, BearerToken, CacheKey,
    PresentedToken, RemoteToken,
};
#[cfg(feature = "http")]
pub use verifier::HttpIdentityVerifier;
pub use verifier::{
    parse_identity_response, IdentityVerifier, RemoteIdentity, VerificationError,
    VerificationRequest, IDENTITY_PATH,
};
