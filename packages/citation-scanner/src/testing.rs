//! Testing utilities including mock implementations.
//!
//! These are useful for exercising traversals without network access or
//! extraction-service calls. [`CitationGraph`] wires a [`MockFetcher`] and a
//! [`MockExtractor`] together so a whole citation graph can be declared in
//! a few lines.

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::error::{
    CacheError, CacheResult, ExtractionError, ExtractionResult, FetchError, FetchResult,
};
use crate::pipeline::parse::DocumentParser;
use crate::traits::{cache::ResultCache, extractor::ClaimExtractor, fetcher::ContentFetcher};
use crate::types::{config::ExtractionConfig, document::Claim};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// A mock fetcher serving canned page text.
///
/// Clones share state, so a clone handed to a parser still reports its
/// calls to the original.
#[derive(Clone, Default)]
pub struct MockFetcher {
    state: Arc<FetcherState>,
}

#[derive(Default)]
struct FetcherState {
    pages: RwLock<HashMap<String, String>>,
    failures: RwLock<HashSet<String>>,
    delays: RwLock<HashMap<String, Duration>>,
    default_delay: RwLock<Option<Duration>>,
    calls: RwLock<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Decrements the in-flight gauge even when a fetch is cancelled.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockFetcher {
    /// Create a fetcher that knows no pages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` for `url`.
    pub fn with_page(self, url: impl Into<String>, content: impl Into<String>) -> Self {
        write(&self.state.pages).insert(url.into(), content.into());
        self
    }

    /// Make every fetch of `url` fail with a transport error.
    pub fn fail_url(self, url: impl Into<String>) -> Self {
        write(&self.state.failures).insert(url.into());
        self
    }

    /// Delay every fetch by `delay`.
    pub fn with_delay(self, delay: Duration) -> Self {
        *write(&self.state.default_delay) = Some(delay);
        self
    }

    /// Delay fetches of `url` by `delay`, overriding the default delay.
    pub fn with_delay_for(self, url: impl Into<String>, delay: Duration) -> Self {
        write(&self.state.delays).insert(url.into(), delay);
        self
    }

    /// Every URL fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        read(&self.state.calls).clone()
    }

    /// How many times `url` was fetched.
    pub fn fetch_count(&self, url: &str) -> usize {
        read(&self.state.calls).iter().filter(|u| *u == url).count()
    }

    /// Total number of fetches.
    pub fn total_fetches(&self) -> usize {
        read(&self.state.calls).len()
    }

    /// Highest number of fetches observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    fn delay_for(&self, url: &str) -> Option<Duration> {
        read(&self.state.delays)
            .get(url)
            .copied()
            .or(*read(&self.state.default_delay))
    }
}

#[async_trait]
impl ContentFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        write(&self.state.calls).push(url.to_string());

        let current = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlight(&self.state.in_flight);

        if let Some(delay) = self.delay_for(url) {
            tokio::time::sleep(delay).await;
        }

        if read(&self.state.failures).contains(url) {
            return Err(FetchError::Http(
                format!("simulated connection failure for {url}").into(),
            ));
        }

        read(&self.state.pages)
            .get(url)
            .cloned()
            .ok_or(FetchError::Status { status: 404 })
    }
}

/// What the mock extractor does for a given input.
#[derive(Debug, Clone)]
enum Reply {
    Payload(String),
    Fail,
    Panic,
}

/// A mock extractor returning canned payloads keyed by input text.
///
/// Unknown input yields an empty claims payload.
#[derive(Clone, Default)]
pub struct MockExtractor {
    replies: Arc<RwLock<HashMap<String, Reply>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockExtractor {
    /// Create an extractor with no canned replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `payload` verbatim when asked about `content`.
    pub fn with_response(self, content: impl Into<String>, payload: impl Into<String>) -> Self {
        write(&self.replies).insert(content.into(), Reply::Payload(payload.into()));
        self
    }

    /// Fail with a service error when asked about `content`.
    pub fn fail_on(self, content: impl Into<String>) -> Self {
        write(&self.replies).insert(content.into(), Reply::Fail);
        self
    }

    /// Panic when asked about `content`.
    pub fn panic_on(self, content: impl Into<String>) -> Self {
        write(&self.replies).insert(content.into(), Reply::Panic);
        self
    }

    /// Every input seen so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        read(&self.calls).clone()
    }

    /// Number of extraction calls.
    pub fn call_count(&self) -> usize {
        read(&self.calls).len()
    }
}

#[async_trait]
impl ClaimExtractor for MockExtractor {
    async fn extract(&self, content: &str, _config: &ExtractionConfig) -> ExtractionResult<String> {
        write(&self.calls).push(content.to_string());

        let reply = read(&self.replies).get(content).cloned();
        match reply {
            Some(Reply::Payload(payload)) => Ok(payload),
            Some(Reply::Fail) => Err(ExtractionError::Service(
                "simulated extraction failure".into(),
            )),
            Some(Reply::Panic) => panic!("simulated extractor panic"),
            None => Ok(r#"{"claims": []}"#.to_string()),
        }
    }
}

/// A cache wrapper that fails chosen operations.
pub struct FlakyCache<C> {
    inner: C,
    failing_gets: HashSet<String>,
    failing_puts: HashSet<String>,
    fail_all_puts: bool,
    put_delay: Option<Duration>,
}

impl<C: ResultCache> FlakyCache<C> {
    /// Wrap `inner`; nothing fails until configured.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            failing_gets: HashSet::new(),
            failing_puts: HashSet::new(),
            fail_all_puts: false,
            put_delay: None,
        }
    }

    /// Fail lookups of `url`.
    pub fn fail_gets_for(mut self, url: impl Into<String>) -> Self {
        self.failing_gets.insert(url.into());
        self
    }

    /// Fail writes of `url`.
    pub fn fail_puts_for(mut self, url: impl Into<String>) -> Self {
        self.failing_puts.insert(url.into());
        self
    }

    /// Fail every write.
    pub fn fail_all_puts(mut self) -> Self {
        self.fail_all_puts = true;
        self
    }

    /// Sleep for `delay` before every write.
    pub fn with_put_delay(mut self, delay: Duration) -> Self {
        self.put_delay = Some(delay);
        self
    }

    /// The wrapped cache.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: ResultCache> ResultCache for FlakyCache<C> {
    async fn get(&self, url: &str) -> CacheResult<Option<String>> {
        if self.failing_gets.contains(url) {
            return Err(CacheError::Storage("simulated lookup failure".into()));
        }
        self.inner.get(url).await
    }

    async fn put(&self, url: &str, value: &str) -> CacheResult<()> {
        if let Some(delay) = self.put_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_all_puts || self.failing_puts.contains(url) {
            return Err(CacheError::Storage("simulated write failure".into()));
        }
        self.inner.put(url, value).await
    }
}

/// Declarative citation graph backed by a mock fetcher and extractor.
///
/// Each declared document is served as `Text of <url>`; the extractor maps
/// that text to one claim citing the declared sources. Undeclared URLs
/// fetch as HTTP 404.
///
/// ```rust,ignore
/// let graph = CitationGraph::new()
///     .document("A", &["B", "C"])
///     .document("B", &[])
///     .document("C", &["A"]);
/// let scanner = CitationScanner::new(graph.parser(), MemoryCache::new());
/// ```
#[derive(Clone, Default)]
pub struct CitationGraph {
    fetcher: MockFetcher,
    extractor: MockExtractor,
}

impl CitationGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Text served for `url`.
    pub fn page_text(url: &str) -> String {
        format!("Text of {url}")
    }

    /// Declare a document whose single claim cites `sources`.
    pub fn document(self, url: &str, sources: &[&str]) -> Self {
        let claim =
            Claim::new(format!("Claim made on {url}")).with_sources(sources.iter().copied());
        self.document_with_claims(url, vec![claim])
    }

    /// Declare a document with explicit claims.
    pub fn document_with_claims(mut self, url: &str, claims: Vec<Claim>) -> Self {
        let text = Self::page_text(url);
        let payload = json!({ "claims": claims }).to_string();
        self.fetcher = self.fetcher.with_page(url, text.clone());
        self.extractor = self.extractor.with_response(text, payload);
        self
    }

    /// Make extraction fail for `url`.
    pub fn failing(mut self, url: &str) -> Self {
        self.extractor = self.extractor.fail_on(Self::page_text(url));
        self
    }

    /// Make extraction panic for `url`.
    pub fn panicking(mut self, url: &str) -> Self {
        self.extractor = self.extractor.panic_on(Self::page_text(url));
        self
    }

    /// Make the extractor answer `url` with a payload that is not claims JSON.
    pub fn malformed(mut self, url: &str) -> Self {
        self.extractor = self
            .extractor
            .with_response(Self::page_text(url), "I could not find any claims.");
        self
    }

    /// Make fetching `url` fail with a transport error.
    pub fn unreachable(mut self, url: &str) -> Self {
        self.fetcher = self.fetcher.fail_url(url);
        self
    }

    /// Delay every fetch.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetcher = self.fetcher.with_delay(delay);
        self
    }

    /// Delay fetches of one URL.
    pub fn with_fetch_delay_for(mut self, url: &str, delay: Duration) -> Self {
        self.fetcher = self.fetcher.with_delay_for(url, delay);
        self
    }

    /// Handle on the shared fetcher, for call assertions.
    pub fn fetcher(&self) -> MockFetcher {
        self.fetcher.clone()
    }

    /// Handle on the shared extractor, for call assertions.
    pub fn extractor(&self) -> MockExtractor {
        self.extractor.clone()
    }

    /// A parser over this graph.
    pub fn parser(&self) -> DocumentParser<MockFetcher, MockExtractor> {
        DocumentParser::new(self.fetcher(), self.extractor())
    }
}
