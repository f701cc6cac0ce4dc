//! Cache entry with an absolute expiry.

use std::time::Duration;

use tokio::time::Instant;

/// A cached value together with the instant it stops being visible.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached payload.
    pub value: V,
    /// Instant at which the entry expires.
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Create an entry that expires `ttl` after `now`.
    pub fn new(value: V, now: Instant, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: now + ttl,
        }
    }

    /// Check whether the entry has expired at `now`.
    ///
    /// Both the read path and the background sweep use this predicate.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
