//! Concurrent, deduplicated, depth-bounded traversal of a citation graph.
//!
//! Every newly discovered URL gets its own task. A task resolves its
//! document (cache, then parser), hands it to the [`Aggregator`], and
//! spawns visits for every cited source one level deeper. Nothing a single
//! branch does can abort its siblings: failures become report entries.
//!
//! # Example
//!
//! ```rust,ignore
//! use citation_scanner::{CitationScanner, DocumentParser, HttpFetcher, MemoryCache};
//!
//! let parser = DocumentParser::new(HttpFetcher::new()?, extractor);
//! let scanner = CitationScanner::new(parser, MemoryCache::new());
//! let report = scanner.traverse("https://example.com/article", 2).await?;
//! ```

use futures::future::{BoxFuture, FutureExt};
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::error::{BranchFailure, CacheError, Result, ScanError};
use crate::pipeline::aggregate::{Aggregator, Visit};
use crate::pipeline::parse::DocumentParser;
use crate::pipeline::resolve::{lookup_or_parse, resolve_document, store_cached, Origin, Resolved};
use crate::traits::{cache::ResultCache, extractor::ClaimExtractor, fetcher::ContentFetcher};
use crate::types::{
    config::TraversalConfig,
    document::ParsedDocument,
    report::AggregateReport,
};

/// Entry point: explores citation graphs with a parser and a result cache.
///
/// Holds its collaborators explicitly; every call to [`traverse`](Self::traverse)
/// gets a fresh visited set and report, so one scanner can serve many
/// independent traversals at once.
pub struct CitationScanner<F, X, C> {
    parser: Arc<DocumentParser<F, X>>,
    cache: Arc<C>,
    config: TraversalConfig,
}

impl<F, X, C> Clone for CitationScanner<F, X, C> {
    fn clone(&self) -> Self {
        Self {
            parser: Arc::clone(&self.parser),
            cache: Arc::clone(&self.cache),
            config: self.config.clone(),
        }
    }
}

impl<F, X, C> CitationScanner<F, X, C>
where
    F: ContentFetcher + 'static,
    X: ClaimExtractor + 'static,
    C: ResultCache + 'static,
{
    /// Create a scanner with unbounded fan-out and no timeouts.
    pub fn new(parser: DocumentParser<F, X>, cache: C) -> Self {
        Self::from_shared(Arc::new(parser), Arc::new(cache))
    }

    /// Create a scanner around collaborators that are shared elsewhere.
    pub fn from_shared(parser: Arc<DocumentParser<F, X>>, cache: Arc<C>) -> Self {
        Self {
            parser,
            cache,
            config: TraversalConfig::default(),
        }
    }

    /// Set the scheduling config.
    pub fn with_config(mut self, config: TraversalConfig) -> Self {
        self.config = config;
        self
    }

    /// The scheduling config.
    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    /// The result cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Explore the citation graph under `root_url` down to `max_depth` edges.
    ///
    /// Depth 0 resolves only the root. Branch failures are collected in
    /// `AggregateReport::errors`; the only errors returned here are
    /// [`ScanError::InvalidDepth`] for a negative depth and
    /// [`ScanError::EmptyRoot`].
    pub async fn traverse(&self, root_url: &str, max_depth: i64) -> Result<AggregateReport> {
        if max_depth < 0 {
            return Err(ScanError::InvalidDepth { depth: max_depth });
        }
        if root_url.is_empty() {
            return Err(ScanError::EmptyRoot);
        }
        let max_depth = usize::try_from(max_depth)
            .map_err(|_| ScanError::InvalidDepth { depth: max_depth })?;

        info!(root = %root_url, max_depth, "Traversal starting");

        let traversal = Arc::new(Traversal {
            parser: Arc::clone(&self.parser),
            cache: Arc::clone(&self.cache),
            aggregator: Aggregator::new(root_url),
            tracker: TaskTracker::new(),
            admission: self
                .config
                .max_concurrency
                .map(|limit| Arc::new(Semaphore::new(limit))),
            document_timeout: self.config.document_timeout,
            max_depth,
        });

        traversal.visit(root_url.to_string(), String::new(), 0);

        // Tasks keep spawning children after close(); wait() returns once
        // the whole task tree has drained.
        traversal.tracker.close();
        traversal.tracker.wait().await;

        let report = traversal.aggregator.take_report();

        info!(
            root = %root_url,
            documents = report.all_claims.len(),
            claims = report.claim_count(),
            errors = report.errors.len(),
            cache_hits = report.stats.cache_hits,
            pruned = report.stats.pruned,
            "Traversal complete"
        );

        Ok(report)
    }

    /// Resolve a single document through the cache, without following sources.
    pub async fn parse_single(&self, url: &str) -> Result<ParsedDocument> {
        if url.is_empty() {
            return Err(ScanError::EmptyRoot);
        }
        let resolved = resolve_document(&self.parser, self.cache.as_ref(), url).await?;
        if let Some(warning) = resolved.warning {
            warn!(url = %url, error = %warning, "Parsed document was not cached");
        }
        Ok(resolved.document)
    }
}

/// State of one traversal invocation, shared by all of its tasks.
struct Traversal<F, X, C> {
    parser: Arc<DocumentParser<F, X>>,
    cache: Arc<C>,
    aggregator: Aggregator,
    tracker: TaskTracker,
    admission: Option<Arc<Semaphore>>,
    document_timeout: Option<Duration>,
    max_depth: usize,
}

impl<F, X, C> Traversal<F, X, C>
where
    F: ContentFetcher + 'static,
    X: ClaimExtractor + 'static,
    C: ResultCache + 'static,
{
    /// Claim `url` and launch its task, unless it is too deep or already claimed.
    fn visit(self: &Arc<Self>, url: String, parent_url: String, depth: usize) {
        self.offer(VecDeque::from([(url, parent_url, depth)]));
    }

    /// Visit every source of `url` one level below `depth`.
    fn expand(self: &Arc<Self>, url: &str, sources: Vec<String>, depth: usize) {
        self.offer(
            sources
                .into_iter()
                .map(|source| (source, url.to_string(), depth + 1))
                .collect(),
        );
    }

    /// Drain `pending` discoveries of `(url, parent, depth)`.
    ///
    /// Re-expansion along a shorter path walks an already expanded subtree,
    /// which can be arbitrarily deep, so it goes through this queue rather
    /// than the call stack.
    fn offer(self: &Arc<Self>, mut pending: VecDeque<(String, String, usize)>) {
        while let Some((url, parent_url, depth)) = pending.pop_front() {
            if depth > self.max_depth {
                debug!(url = %url, depth, "Depth bound reached, dropping");
                self.aggregator.note_pruned();
                continue;
            }

            match self.aggregator.claim_visit_at(&url, depth) {
                Visit::First => {
                    self.tracker.spawn(Arc::clone(self).process(url, parent_url));
                }
                Visit::Shallower { sources } => {
                    debug!(url = %url, depth, "Reached on a shorter path, re-expanding");
                    pending.extend(
                        sources
                            .into_iter()
                            .map(|source| (source, url.clone(), depth + 1)),
                    );
                }
                Visit::Seen => {
                    debug!(url = %url, parent = %parent_url, "Already visited");
                }
            }
        }
    }

    /// Body of one task: resolve, record, fan out.
    fn process(self: Arc<Self>, url: String, parent_url: String) -> BoxFuture<'static, ()> {
        async move {
            let outcome = AssertUnwindSafe(self.resolve(&url)).catch_unwind().await;

            let resolved = match outcome {
                Ok(Ok(resolved)) => resolved,
                Ok(Err(failure)) => {
                    self.aggregator.record_failure(&failure);
                    return;
                }
                Err(_) => {
                    self.aggregator
                        .record_failure(&BranchFailure::Panicked { url });
                    return;
                }
            };

            if let Some(warning) = &resolved.warning {
                self.aggregator.record_failure(warning);
            }

            let mut document = resolved.document;
            document.parent_url = parent_url;

            let sources: Vec<String> = document.source_urls().map(str::to_owned).collect();
            self.aggregator.record_document(document);

            if let Some(depth) = self.aggregator.mark_expanded(&url, &sources) {
                self.expand(&url, sources, depth);
            }
        }
        .boxed()
    }

    /// Cache-or-parse under the admission limit and timeout.
    ///
    /// The permit is dropped before the caller fans out, so a bounded pool
    /// never waits on its own children. The timeout covers lookup and
    /// parse; the cache write gets its own budget and can only produce a
    /// warning.
    async fn resolve(&self, url: &str) -> std::result::Result<Resolved, BranchFailure> {
        let _permit = match &self.admission {
            Some(semaphore) => semaphore.acquire().await.ok(),
            None => None,
        };

        let work = lookup_or_parse(&self.parser, self.cache.as_ref(), url);
        let (document, origin) = match self.document_timeout {
            Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| {
                BranchFailure::Timeout {
                    url: url.to_string(),
                    millis: as_millis(limit),
                }
            })??,
            None => work.await?,
        };

        let warning = match origin {
            Origin::Cache => {
                self.aggregator.note_cache_hit();
                None
            }
            Origin::Parsed => {
                self.aggregator.note_cache_miss();
                self.store(&document).await
            }
        };

        Ok(Resolved {
            document,
            origin,
            warning,
        })
    }

    /// Write a freshly parsed document back to the cache.
    async fn store(&self, document: &ParsedDocument) -> Option<BranchFailure> {
        let write = store_cached(self.cache.as_ref(), document);
        match self.document_timeout {
            Some(limit) => match tokio::time::timeout(limit, write).await {
                Ok(result) => result.err(),
                Err(_) => Some(BranchFailure::CacheWrite {
                    url: document.page.clone(),
                    source: CacheError::TimedOut {
                        millis: as_millis(limit),
                    },
                }),
            },
            None => write.await.err(),
        }
    }
}

fn as_millis(limit: Duration) -> u64 {
    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
}
