//! Claim extractor trait.

use async_trait::async_trait;

use crate::error::ExtractionResult;
use crate::types::config::ExtractionConfig;

/// Turns document text into a structured claims payload.
///
/// The returned string is the raw payload, expected to look like
/// `{"claims": [{"claim": "...", "sources": ["..."]}]}`. Validating that
/// shape is left to the caller so a malformed answer can be told apart
/// from a failed call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClaimExtractor: Send + Sync {
    /// Extract claims and their cited sources from `content`.
    async fn extract(&self, content: &str, config: &ExtractionConfig) -> ExtractionResult<String>;
}
