//! Citation Graph Scanner
//!
//! Starting from one document, extracts the claims it makes and the sources
//! each claim cites, then follows those sources recursively, concurrently
//! and without revisiting anything, down to a depth bound. Every document
//! reached and every failure met along the way ends up in one
//! [`AggregateReport`].
//!
//! # Design
//!
//! - The engine only sees three traits: [`ContentFetcher`],
//!   [`ClaimExtractor`], [`ResultCache`]
//! - One traversal = one visited set + one report; nothing is global
//! - A failing branch never aborts its siblings; its error is reported
//!
//! # Usage
//!
//! ```rust,ignore
//! use citation_scanner::{CitationScanner, DocumentParser, MemoryCache};
//! use citation_scanner::testing::CitationGraph;
//!
//! let graph = CitationGraph::new()
//!     .document("A", &["B", "C"])
//!     .document("B", &[])
//!     .document("C", &["A"]);
//!
//! let scanner = CitationScanner::new(graph.parser(), MemoryCache::new());
//! let report = scanner.traverse("A", 5).await?;
//! assert_eq!(report.all_claims.len(), 3);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator abstractions (fetcher, extractor, cache)
//! - [`types`] - Documents, reports and configuration
//! - [`pipeline`] - Parsing, aggregation and the traversal engine
//! - [`fetchers`] - HTTP and rate-limited fetchers
//! - [`caches`] - Memory and SQLite result caches
//! - [`config`] - Environment configuration
//! - [`testing`] - Mock implementations for testing

pub mod caches;
pub mod config;
pub mod error;
pub mod fetchers;
pub mod pipeline;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "openai")]
pub mod extractors;

// Re-export core types at crate root
pub use config::{ScannerConfig, SecretString};
pub use error::{
    BranchFailure, CacheError, ConfigError, ExtractionError, FetchError, ParseError, ScanError,
};
pub use traits::{cache::ResultCache, extractor::ClaimExtractor, fetcher::ContentFetcher};
pub use types::{
    config::{ExtractionConfig, TraversalConfig, DEFAULT_SYSTEM_ROLE},
    document::{Claim, ClaimsPayload, ParsedDocument},
    report::{AggregateReport, TraversalStats},
};

// Re-export pipeline components
pub use pipeline::{
    format_claims_prompt, parse_claims_response, Aggregator, CitationScanner, DocumentParser,
    Record,
};

// Re-export fetchers
pub use fetchers::{FetcherExt, HttpFetcher, RateLimitedFetcher};

// Re-export caches
pub use caches::MemoryCache;

#[cfg(feature = "sqlite")]
pub use caches::SqliteCache;

#[cfg(feature = "openai")]
pub use extractors::OpenAIExtractor;
