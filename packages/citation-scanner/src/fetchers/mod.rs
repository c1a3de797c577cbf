//! Content fetcher implementations.
//!
//! # Available Fetchers
//!
//! - `HttpFetcher` - HTTP GET with HTML-to-text reduction
//! - `RateLimitedFetcher` - Wraps any fetcher with a request quota
//!
//! # Example
//!
//! ```rust,ignore
//! use citation_scanner::fetchers::{FetcherExt, HttpFetcher};
//!
//! let fetcher = HttpFetcher::new()?.rate_limited_with_burst(5, 10);
//! ```

mod http;
mod rate_limited;

pub use http::{HttpFetcher, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use rate_limited::{FetcherExt, RateLimitedFetcher};
