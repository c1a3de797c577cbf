//! Cache-or-parse resolution of one document.
//!
//! Adapts the string-valued cache contract to typed documents: values are
//! the JSON form of a [`ParsedDocument`], stored before a parent is set.

use tracing::debug;

use crate::error::BranchFailure;
use crate::pipeline::parse::DocumentParser;
use crate::traits::{cache::ResultCache, extractor::ClaimExtractor, fetcher::ContentFetcher};
use crate::types::document::ParsedDocument;

/// Where a resolved document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Parsed,
}

/// A document ready to be aggregated.
#[derive(Debug)]
pub struct Resolved {
    pub document: ParsedDocument,
    pub origin: Origin,

    /// Failure that did not cost the document (encode or cache write)
    pub warning: Option<BranchFailure>,
}

/// Look `url` up in the cache, parsing and caching it on a miss.
///
/// Errors are the failures that lose the document; anything softer comes
/// back as `Resolved::warning`.
pub async fn resolve_document<F, X, C>(
    parser: &DocumentParser<F, X>,
    cache: &C,
    url: &str,
) -> Result<Resolved, BranchFailure>
where
    F: ContentFetcher,
    X: ClaimExtractor,
    C: ResultCache + ?Sized,
{
    let (document, origin) = lookup_or_parse(parser, cache, url).await?;
    let warning = match origin {
        Origin::Cache => None,
        Origin::Parsed => store_cached(cache, &document).await.err(),
    };

    Ok(Resolved {
        document,
        origin,
        warning,
    })
}

/// Look `url` up in the cache, parsing it on a miss. Nothing is written back.
pub async fn lookup_or_parse<F, X, C>(
    parser: &DocumentParser<F, X>,
    cache: &C,
    url: &str,
) -> Result<(ParsedDocument, Origin), BranchFailure>
where
    F: ContentFetcher,
    X: ClaimExtractor,
    C: ResultCache + ?Sized,
{
    if let Some(document) = load_cached(cache, url).await? {
        debug!(url = %url, "Cache hit");
        return Ok((document, Origin::Cache));
    }

    debug!(url = %url, "Cache miss, parsing");
    let document = parser
        .parse_document(url)
        .await
        .map_err(|source| BranchFailure::Parse {
            url: url.to_string(),
            source,
        })?;

    Ok((document, Origin::Parsed))
}

/// Read and decode a cached document.
pub async fn load_cached<C>(cache: &C, url: &str) -> Result<Option<ParsedDocument>, BranchFailure>
where
    C: ResultCache + ?Sized,
{
    let Some(raw) = cache
        .get(url)
        .await
        .map_err(|source| BranchFailure::CacheLookup {
            url: url.to_string(),
            source,
        })?
    else {
        return Ok(None);
    };

    let mut document: ParsedDocument =
        serde_json::from_str(&raw).map_err(|source| BranchFailure::CacheDecode {
            url: url.to_string(),
            source,
        })?;

    if document.page.is_empty() {
        document.page = url.to_string();
    }

    Ok(Some(document))
}

/// Encode a document and write it under its own URL.
pub async fn store_cached<C>(cache: &C, document: &ParsedDocument) -> Result<(), BranchFailure>
where
    C: ResultCache + ?Sized,
{
    let raw = serde_json::to_string(document).map_err(|source| BranchFailure::Encode {
        url: document.page.clone(),
        source,
    })?;

    cache
        .put(&document.page, &raw)
        .await
        .map_err(|source| BranchFailure::CacheWrite {
            url: document.page.clone(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caches::MemoryCache;
    use crate::error::CacheError;
    use crate::testing::{CitationGraph, FlakyCache};
    use crate::types::document::Claim;

    #[tokio::test]
    async fn test_miss_parses_and_stores() {
        let graph = CitationGraph::new().document("a", &["b"]);
        let parser = graph.parser();
        let cache = MemoryCache::new();

        let resolved = resolve_document(&parser, &cache, "a").await.unwrap();
        assert_eq!(resolved.origin, Origin::Parsed);
        assert!(resolved.warning.is_none());
        assert_eq!(resolved.document.source_urls().collect::<Vec<_>>(), vec!["b"]);

        let cached = load_cached(&cache, "a").await.unwrap().unwrap();
        assert_eq!(cached, resolved.document);
    }

    #[tokio::test]
    async fn test_hit_skips_parser() {
        let graph = CitationGraph::new().document("a", &[]);
        let parser = graph.parser();
        let cache = MemoryCache::new();
        let stored = ParsedDocument::new("a").with_claim(Claim::new("cached claim"));
        store_cached(&cache, &stored).await.unwrap();

        let resolved = resolve_document(&parser, &cache, "a").await.unwrap();
        assert_eq!(resolved.origin, Origin::Cache);
        assert_eq!(resolved.document, stored);
        assert_eq!(graph.fetcher().fetch_count("a"), 0);
        assert_eq!(graph.extractor().call_count(), 0);
    }

    #[tokio::test]
    async fn test_lookup_or_parse_leaves_cache_untouched() {
        let graph = CitationGraph::new().document("a", &[]);
        let cache = MemoryCache::new();

        let (document, origin) = lookup_or_parse(&graph.parser(), &cache, "a").await.unwrap();
        assert_eq!(origin, Origin::Parsed);
        assert_eq!(document.page, "a");
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_fatal() {
        let graph = CitationGraph::new().document("a", &[]);
        let cache = MemoryCache::new();
        cache.put("a", "not json").await.unwrap();

        let failure = resolve_document(&graph.parser(), &cache, "a")
            .await
            .unwrap_err();
        assert!(matches!(failure, BranchFailure::CacheDecode { .. }));
    }

    #[tokio::test]
    async fn test_write_failure_keeps_document() {
        let graph = CitationGraph::new().document("a", &["b"]);
        let cache = FlakyCache::new(MemoryCache::new()).fail_puts_for("a");

        let resolved = resolve_document(&graph.parser(), &cache, "a").await.unwrap();
        assert_eq!(resolved.document.page, "a");
        assert!(matches!(
            resolved.warning,
            Some(BranchFailure::CacheWrite {
                source: CacheError::Storage(_),
                ..
            })
        ));
    }
}
