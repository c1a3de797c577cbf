//! SQLite result cache.
//!
//! Persists parse results across runs so repeated traversals of the same
//! graph skip the fetch and the extraction call. Good for:
//! - Local development
//! - Command-line runs over the same corpus

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::caches::memory::DEFAULT_TTL_SECS;
use crate::error::{CacheError, CacheResult};
use crate::traits::cache::ResultCache;

fn storage(e: sqlx::Error) -> CacheError {
    CacheError::Storage(Box::new(e))
}

/// SQLite-backed result cache with per-entry expiry.
pub struct SqliteCache {
    pool: SqlitePool,
    ttl: Duration,
}

impl SqliteCache {
    /// Open (and migrate) a cache at the given connection URL.
    ///
    /// # Example URLs
    /// - `sqlite://cache.db?mode=rwc` - File-based, create if missing
    /// - `sqlite::memory:` - Ephemeral, see [`in_memory`](Self::in_memory)
    pub async fn new(database_url: &str) -> CacheResult<Self> {
        Self::open(database_url, 5).await
    }

    /// Create an in-memory cache (for testing).
    ///
    /// Every SQLite memory connection is its own database, so the pool
    /// holds exactly one.
    pub async fn in_memory() -> CacheResult<Self> {
        Self::open("sqlite::memory:", 1).await
    }

    async fn open(database_url: &str, max_connections: u32) -> CacheResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(storage)?;

        let cache = Self {
            pool,
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
        };
        cache.run_migrations().await?;
        Ok(cache)
    }

    /// Set the time-to-live for entries.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// The configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn run_migrations(&self) -> CacheResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache (
                url TEXT PRIMARY KEY,
                response TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }

    /// Oldest storage time (unix millis) that is still fresh.
    fn cutoff_millis(&self) -> i64 {
        (Utc::now() - self.ttl).timestamp_millis()
    }

    /// Delete every expired row, returning how many were removed.
    pub async fn purge_expired(&self) -> CacheResult<u64> {
        let result = sqlx::query("DELETE FROM cache WHERE timestamp <= ?")
            .bind(self.cutoff_millis())
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        Ok(result.rows_affected())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ResultCache for SqliteCache {
    async fn get(&self, url: &str) -> CacheResult<Option<String>> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT response, timestamp FROM cache WHERE url = ?")
                .bind(url)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage)?;

        Ok(row
            .filter(|(_, stored_at)| *stored_at > self.cutoff_millis())
            .map(|(response, _)| response))
    }

    async fn put(&self, url: &str, value: &str) -> CacheResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cache (url, response, timestamp)
            VALUES (?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                response = excluded.response,
                timestamp = excluded.timestamp
            "#,
        )
        .bind(url)
        .bind(value)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }
}
