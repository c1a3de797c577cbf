//! Single-document parsing: fetch → extract → validate.
//!
//! Knows nothing about caching or recursion; the traversal engine wraps it.

use tracing::debug;

use crate::error::{ParseError, ParseResult};
use crate::traits::{extractor::ClaimExtractor, fetcher::ContentFetcher};
use crate::types::{
    config::ExtractionConfig,
    document::{ClaimsPayload, ParsedDocument},
};

/// Composes a fetcher and an extractor into "parse one document".
pub struct DocumentParser<F, X> {
    fetcher: F,
    extractor: X,
    config: ExtractionConfig,
}

impl<F, X> DocumentParser<F, X>
where
    F: ContentFetcher,
    X: ClaimExtractor,
{
    /// Create a parser with the default extraction config.
    pub fn new(fetcher: F, extractor: X) -> Self {
        Self {
            fetcher,
            extractor,
            config: ExtractionConfig::default(),
        }
    }

    /// Set the extraction config.
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// The extraction config sent with every call.
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Parse one document into its claims.
    ///
    /// The returned document has `page` set to `url` and no parent.
    pub async fn parse_document(&self, url: &str) -> ParseResult<ParsedDocument> {
        let content = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|source| ParseError::Fetch {
                url: url.to_string(),
                source,
            })?;

        debug!(url = %url, content_length = content.len(), "Fetched document");

        let raw = self
            .extractor
            .extract(&content, &self.config)
            .await
            .map_err(|source| ParseError::Extraction {
                url: url.to_string(),
                source,
            })?;

        let payload =
            parse_claims_response(&raw).map_err(|source| ParseError::MalformedResponse {
                url: url.to_string(),
                source,
            })?;

        debug!(url = %url, claims = payload.claims.len(), "Extracted claims");

        Ok(ParsedDocument {
            page: url.to_string(),
            parent_url: String::new(),
            claims: payload.claims,
        })
    }
}

/// Parse an extractor payload into claims.
///
/// Tolerates a surrounding markdown code fence, which models add even
/// when told not to.
pub fn parse_claims_response(raw: &str) -> Result<ClaimsPayload, serde_json::Error> {
    serde_json::from_str(strip_code_fence(raw))
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
