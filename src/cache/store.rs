//! Thread-safe TTL store.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use super::CacheEntry;

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of stored entries (expired entries count until swept).
    pub item_count: usize,
    /// TTL applied when `set` is called with a zero TTL.
    pub default_ttl: Duration,
}

/// Keyed store whose entries expire after a time-to-live.
///
/// Values are cloned in and out, so a caller never observes a later
/// mutation of what it read.
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    default_ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    /// Create an empty cache without a background sweeper.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Create a shared cache and start its background sweeper.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_cleanup(default_ttl: Duration, cleanup_interval: Duration) -> Arc<Self>
    where
        V: Send + Sync + 'static,
    {
        let cache = Arc::new(Self::new(default_ttl));
        cache.spawn_sweeper(cleanup_interval);
        cache
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a clone of the value stored under `key`, if present and not expired.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        {
            let entries = self.read();
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        // Expired: evict under the write lock, re-checking in case the key
        // was refreshed between the two critical sections.
        let mut entries = self.write();
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
            debug!(key, "evicted expired cache entry on read");
        }
        None
    }

    /// Store `value` under `key` for `ttl`.
    ///
    /// A zero `ttl` substitutes the configured default.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.set_at(key.into(), value, ttl, Instant::now());
    }

    pub(crate) fn set_at(&self, key: String, value: V, ttl: Duration, now: Instant) {
        let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
        self.write().insert(key, CacheEntry::new(value, now, ttl));
    }

    /// Remove the entry stored under `key`.
    pub fn delete(&self, key: &str) {
        self.write().remove(key);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Get current occupancy.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            item_count: self.read().len(),
            default_ttl: self.default_ttl,
        }
    }

    /// Get the default TTL.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Remove every expired entry.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub(crate) fn purge_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Start a tokio task that purges expired entries every `interval`.
    ///
    /// The task holds only a weak reference and exits once the cache is
    /// dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()>
    where
        V: Send + Sync + 'static,
    {
        let cache: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let removed = cache.purge_expired();
                if removed > 0 {
                    debug!(removed, "cache sweep removed expired entries");
                }
            }
        })
    }
}
