//! Result cache implementations.
//!
//! Available backends:
//! - `MemoryCache` - In-memory cache (always available)
//! - `SqliteCache` - SQLite file-based cache (requires `sqlite` feature)

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryCache;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCache;
