//! In-memory result cache for testing and development.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::error::CacheResult;
use crate::traits::cache::ResultCache;

/// Default time-to-live for cached results: one day.
pub const DEFAULT_TTL_SECS: i64 = 24 * 60 * 60;

struct Entry {
    value: String,
    stored_at: DateTime<Utc>,
}

/// In-memory cache with per-entry expiry.
///
/// Useful for testing and single-process runs. Data is lost on restart.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    /// Create an empty cache with the default TTL.
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(DEFAULT_TTL_SECS))
    }

    /// Create an empty cache whose entries expire after `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// The configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        now >= entry.stored_at + self.ttl
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        before - entries.len()
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self, url: &str) -> CacheResult<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .get(url)
            .filter(|entry| !self.is_expired(entry, Utc::now()))
            .map(|entry| entry.value.clone()))
    }

    async fn put(&self, url: &str, value: &str) -> CacheResult<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                url.to_string(),
                Entry {
                    value: value.to_string(),
                    stored_at: Utc::now(),
                },
            );
        Ok(())
    }
}
