//! Claims and parsed documents.

use serde::{Deserialize, Deserializer, Serialize};

/// One extracted assertion and the documents it cites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// The claim text, quoted from the page
    #[serde(rename = "claim")]
    pub text: String,

    /// Cited source URLs, in the order they appear. Never null.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sources: Vec<String>,
}

impl Claim {
    /// Create a claim with no sources.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
        }
    }

    /// Add a cited source.
    pub fn with_source(mut self, url: impl Into<String>) -> Self {
        self.sources.push(url.into());
        self
    }

    /// Add multiple cited sources.
    pub fn with_sources(mut self, urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.sources.extend(urls.into_iter().map(|u| u.into()));
        self
    }
}

/// The claims found on one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// URL of the parsed document
    #[serde(default)]
    pub page: String,

    /// URL of the document that led here (empty for the root)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent_url: String,

    /// Claims in extraction order
    #[serde(default, deserialize_with = "null_as_empty")]
    pub claims: Vec<Claim>,
}

impl ParsedDocument {
    /// Create an empty document for a URL.
    pub fn new(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            parent_url: String::new(),
            claims: Vec::new(),
        }
    }

    /// Add a claim.
    pub fn with_claim(mut self, claim: Claim) -> Self {
        self.claims.push(claim);
        self
    }

    /// Set the parent URL.
    pub fn with_parent(mut self, parent_url: impl Into<String>) -> Self {
        self.parent_url = parent_url.into();
        self
    }

    /// Every cited source across all claims, in claim order.
    ///
    /// Duplicates are kept; deduplication is the traversal's job.
    pub fn source_urls(&self) -> impl Iterator<Item = &str> {
        self.claims
            .iter()
            .flat_map(|c| c.sources.iter().map(String::as_str))
    }
}

/// Shape of the extractor's payload: `{"claims": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimsPayload {
    #[serde(deserialize_with = "null_as_empty")]
    pub claims: Vec<Claim>,
}

/// Treat an explicit JSON `null` like a missing list.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
