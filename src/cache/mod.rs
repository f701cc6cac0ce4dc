//! Time-bounded result cache.
//!
//! This module provides a generic keyed store whose entries expire after a
//! time-to-live:
//! - Lazy eviction when an expired entry is read
//! - Periodic background sweeps for entries that are never read again
//! - No size bound; growth is limited only by expiry
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tool_runner::cache::TtlCache;
//!
//! let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(60));
//! cache.set("echo hi", "hi\n".to_string(), Duration::ZERO);
//! assert_eq!(cache.get("echo hi").as_deref(), Some("hi\n"));
//! ```

mod entry;
mod store;

pub use entry::CacheEntry;
pub use store::{CacheStats, TtlCache};
