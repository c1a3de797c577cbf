//! Content fetcher trait.

use async_trait::async_trait;

use crate::error::FetchResult;

/// Turns a document URL into extractable plain text.
///
/// Implementations:
/// - `HttpFetcher` - GET + HTML-to-text
/// - `RateLimitedFetcher` - throttles any other fetcher
/// - `MockFetcher` - canned content for tests
///
/// Called concurrently from many traversal tasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the text content of one document.
    async fn fetch(&self, url: &str) -> FetchResult<String>;
}
