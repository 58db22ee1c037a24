//! Short-lived memory of remote authentication outcomes.

use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::token::CacheKey;
use super::ResolvedIdentity;
use crate::errors::RejectionReason;
use crate::utils::{add_duration, Clock, SystemClock, Timestamp};

/// A remembered outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedOutcome {
    /// The remote cluster vouched for this identity.
    Accepted(ResolvedIdentity),
    /// The token was rejected for this reason.
    Rejected(RejectionReason),
}

impl CachedOutcome {
    /// Returns true for accepted outcomes.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    outcome: CachedOutcome,
    expires_at: Timestamp,
}

/// Outcomes keyed by (salted token, remote cluster), each with its own
/// expiry.
///
/// Entries are replaced whole, so a reader sees either the old entry, the
/// new one, or nothing. Expired entries are never returned.
pub struct AuthCache {
    entries: DashMap<CacheKey, CacheEntry>,
    clock: Arc<dyn Clock>,
}

impl AuthCache {
    /// Creates an empty cache on the given clock.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// The clock expiry is measured against.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The current time on this cache's clock.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Returns the live outcome for `key`, dropping it if it has expired.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<CachedOutcome> {
        let now = self.now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Some(entry.outcome.clone());
            }
        }
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        None
    }

    /// Stores `outcome` until `expires_at`.
    ///
    /// An expiry that is not in the future stores nothing.
    pub fn insert(&self, key: CacheKey, outcome: CachedOutcome, expires_at: Timestamp) {
        if expires_at <= self.now() {
            return;
        }
        self.entries.insert(key, CacheEntry { outcome, expires_at });
    }

    /// Stores `outcome` for `ttl` from now.
    pub fn insert_for(&self, key: CacheKey, outcome: CachedOutcome, ttl: Duration) {
        let expires_at = add_duration(self.now(), ttl);
        self.insert(key, outcome, expires_at);
    }

    /// Forgets `key`.
    pub fn invalidate(&self, key: &CacheKey) {
        self.entries.remove(key);
    }

    /// Drops every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forgets everything.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for AuthCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl fmt::Debug for AuthCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCache")
            .field("entries", &self.entries.len())
            .field("clock", &self.clock)
            .finish()
    }
}
