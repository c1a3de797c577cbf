//! Typed errors for the citation scanner.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Collaborator errors
//! (`FetchError`, `ExtractionError`, `CacheError`) never escape a
//! traversal: they are folded into a [`BranchFailure`] and recorded
//! as a string on the report.

use thiserror::Error;

/// Errors returned by a [`ContentFetcher`](crate::traits::fetcher::ContentFetcher).
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Server answered with a non-success status
    #[error("unexpected HTTP status: {status}")]
    Status { status: u16 },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Document had no extractable text
    #[error("no text content at: {url}")]
    EmptyContent { url: String },
}

/// Errors returned by a [`ClaimExtractor`](crate::traits::extractor::ClaimExtractor).
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Extraction service unavailable or failed
    #[error("extraction service error: {0}")]
    Service(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Service answered without any usable output
    #[error("extraction service returned no output")]
    EmptyResponse,

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Errors returned by a [`ResultCache`](crate::traits::cache::ResultCache).
#[derive(Debug, Error)]
pub enum CacheError {
    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Operation did not finish within the traversal's time limit
    #[error("cache operation timed out after {millis}ms")]
    TimedOut { millis: u64 },
}

/// Failure of the single-document parser.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Content could not be fetched
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    /// Claim extraction failed
    #[error("failed to extract claims from {url}: {source}")]
    Extraction {
        url: String,
        #[source]
        source: ExtractionError,
    },

    /// Extractor output did not have the claims shape
    #[error("malformed extraction response for {url}: {source}")]
    MalformedResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ParseError {
    /// URL of the document that failed to parse.
    pub fn url(&self) -> &str {
        match self {
            Self::Fetch { url, .. }
            | Self::Extraction { url, .. }
            | Self::MalformedResponse { url, .. } => url,
        }
    }
}

/// One failed step inside a traversal branch.
///
/// The `Display` form is what lands in `AggregateReport::errors`.
#[derive(Debug, Error)]
pub enum BranchFailure {
    #[error("Error accessing cache for {url}: {source}")]
    CacheLookup {
        url: String,
        #[source]
        source: CacheError,
    },

    #[error("Error decoding cached document for {url}: {source}")]
    CacheDecode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Error parsing {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: ParseError,
    },

    #[error("Error encoding document for {url}: {source}")]
    Encode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Error caching document for {url}: {source}")]
    CacheWrite {
        url: String,
        #[source]
        source: CacheError,
    },

    #[error("Timed out processing {url} after {millis}ms")]
    Timeout { url: String, millis: u64 },

    #[error("Task processing {url} panicked")]
    Panicked { url: String },
}

impl BranchFailure {
    /// URL of the document this failure belongs to.
    pub fn url(&self) -> &str {
        match self {
            Self::CacheLookup { url, .. }
            | Self::CacheDecode { url, .. }
            | Self::Parse { url, .. }
            | Self::Encode { url, .. }
            | Self::CacheWrite { url, .. }
            | Self::Timeout { url, .. }
            | Self::Panicked { url } => url,
        }
    }
}

/// Errors returned by the scanner itself.
///
/// `traverse` only fails on invalid arguments; branch failures are
/// reported inside the aggregate instead.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Depth bound below zero
    #[error("invalid max depth: {depth} (must be >= 0)")]
    InvalidDepth { depth: i64 },

    /// Root identifier was empty
    #[error("root URL must not be empty")]
    EmptyRoot,

    /// Single-page lookup failed (only from `parse_single`)
    #[error(transparent)]
    Branch(#[from] BranchFailure),
}

/// Errors loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed
    #[error("{name} is invalid: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Result type alias for traversal operations.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for extraction operations.
pub type ExtractionResult<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Result type alias for single-document parsing.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
