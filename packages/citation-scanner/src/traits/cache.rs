//! Result cache trait.

use async_trait::async_trait;

use crate::error::CacheResult;

/// Key-value store of serialized parse results, keyed by document URL.
///
/// Entries expire after an implementation-defined time-to-live. An
/// expired entry and a missing entry both read as `None`; callers cannot
/// and should not tell them apart.
///
/// Must tolerate concurrent calls from many traversal tasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Look up a cached value.
    async fn get(&self, url: &str) -> CacheResult<Option<String>>;

    /// Store a value, replacing any previous entry and restarting its TTL.
    async fn put(&self, url: &str, value: &str) -> CacheResult<()>;
}
