//! Shared state of one traversal: the visited set and the report.
//!
//! Both live behind a single mutex. Critical sections are short and
//! never await, so one lock domain is enough.
//!
//! The visited set remembers the shallowest depth each URL was reached
//! at. A URL is claimed (and resolved) once, but if it is rediscovered on a
//! shorter path after its sources were expanded, those sources are handed
//! back for re-expansion so the depth bound applies to shortest paths no
//! matter which path won the race.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::warn;

use crate::error::BranchFailure;
use crate::types::{
    document::ParsedDocument,
    report::{AggregateReport, TraversalStats},
};

/// Something a traversal task hands back to the aggregate.
#[derive(Debug)]
pub enum Record {
    /// A resolved document
    Document(ParsedDocument),
    /// A branch failure, already rendered
    Error(String),
}

/// Outcome of offering a discovered URL to the visited set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    /// First discovery: the caller owns resolving this URL
    First,
    /// Reached on a shorter path after expansion; re-expand these sources
    Shallower { sources: Vec<String> },
    /// Nothing to do
    Seen,
}

/// Race-free accumulator for one traversal.
pub struct Aggregator {
    state: Mutex<AggregatorState>,
}

struct AggregatorState {
    visited: HashMap<String, VisitState>,
    report: AggregateReport,
}

struct VisitState {
    depth: usize,
    /// Sources of the resolved document, once it has been expanded
    sources: Option<Vec<String>>,
}

impl Aggregator {
    /// Create an empty aggregate for a root URL.
    pub fn new(root_page: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(AggregatorState {
                visited: HashMap::new(),
                report: AggregateReport::new(root_page),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AggregatorState> {
        // No critical section can panic halfway, so a poisoned lock still
        // guards consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically test-and-set `url` in the visited set.
    ///
    /// Returns `true` exactly once per URL: for the caller that claimed it.
    pub fn claim_visit(&self, url: &str) -> bool {
        self.claim_visit_at(url, usize::MAX) == Visit::First
    }

    /// Atomically offer `url`, discovered at `depth`, to the visited set.
    pub fn claim_visit_at(&self, url: &str, depth: usize) -> Visit {
        let mut guard = self.lock();
        let state = &mut *guard;

        let Some(entry) = state.visited.get_mut(url) else {
            state.visited.insert(
                url.to_string(),
                VisitState {
                    depth,
                    sources: None,
                },
            );
            return Visit::First;
        };

        state.report.stats.duplicates += 1;
        if depth >= entry.depth {
            return Visit::Seen;
        }
        entry.depth = depth;
        match &entry.sources {
            Some(sources) => Visit::Shallower {
                sources: sources.clone(),
            },
            // Still resolving; the owner reads the new depth in mark_expanded
            None => Visit::Seen,
        }
    }

    /// Record the sources of a claimed URL and return the depth to expand them at.
    ///
    /// Returns the shallowest depth seen so far, which may be less than the
    /// depth the URL was claimed at.
    pub fn mark_expanded(&self, url: &str, sources: &[String]) -> Option<usize> {
        let mut state = self.lock();
        let entry = state.visited.get_mut(url)?;
        entry.sources = Some(sources.to_vec());
        Some(entry.depth)
    }

    /// Append a document or an error to the report.
    pub fn record(&self, record: Record) {
        let mut state = self.lock();
        match record {
            Record::Document(document) => state.report.all_claims.push(document),
            Record::Error(message) => state.report.errors.push(message),
        }
    }

    /// Append a resolved document.
    pub fn record_document(&self, document: ParsedDocument) {
        self.record(Record::Document(document));
    }

    /// Log and append a branch failure.
    pub fn record_failure(&self, failure: &BranchFailure) {
        warn!(url = %failure.url(), error = %failure, "Traversal branch failed");
        self.record(Record::Error(failure.to_string()));
    }

    /// Count a discovery dropped by the depth bound.
    pub fn note_pruned(&self) {
        self.lock().report.stats.pruned += 1;
    }

    /// Count a cache hit.
    pub fn note_cache_hit(&self) {
        self.lock().report.stats.cache_hits += 1;
    }

    /// Count a cache miss.
    pub fn note_cache_miss(&self) {
        self.lock().report.stats.cache_misses += 1;
    }

    /// Number of URLs claimed so far.
    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    /// Current counters.
    pub fn stats(&self) -> TraversalStats {
        self.lock().report.stats
    }

    /// Take the finished report, leaving an empty one behind.
    ///
    /// Call once every task has completed.
    pub fn take_report(&self) -> AggregateReport {
        let mut state = self.lock();
        let root_page = state.report.root_page.clone();
        std::mem::replace(&mut state.report, AggregateReport::new(root_page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_claim_visit_is_test_and_set() {
        let aggregator = Aggregator::new("a");

        assert!(aggregator.claim_visit("a"));
        assert!(!aggregator.claim_visit("a"));
        assert!(aggregator.claim_visit("b"));
        assert_eq!(aggregator.visited_count(), 2);
        assert_eq!(aggregator.stats().duplicates, 1);
    }

    #[test]
    fn test_shallower_rediscovery_before_expansion() {
        let aggregator = Aggregator::new("root");

        assert_eq!(aggregator.claim_visit_at("x", 3), Visit::First);
        assert_eq!(aggregator.claim_visit_at("x", 1), Visit::Seen);
        assert_eq!(aggregator.mark_expanded("x", &["y".to_string()]), Some(1));
    }

    #[test]
    fn test_shallower_rediscovery_after_expansion() {
        let aggregator = Aggregator::new("root");
        let sources = vec!["y".to_string(), "z".to_string()];

        assert_eq!(aggregator.claim_visit_at("x", 3), Visit::First);
        assert_eq!(aggregator.mark_expanded("x", &sources), Some(3));
        assert_eq!(aggregator.claim_visit_at("x", 4), Visit::Seen);
        assert_eq!(
            aggregator.claim_visit_at("x", 1),
            Visit::Shallower { sources }
        );
        assert_eq!(aggregator.claim_visit_at("x", 1), Visit::Seen);
        assert_eq!(aggregator.stats().duplicates, 3);
    }

    #[test]
    fn test_concurrent_claims_admit_one_winner() {
        let aggregator = Arc::new(Aggregator::new("root"));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let aggregator = Arc::clone(&aggregator);
                std::thread::spawn(move || {
                    (0..100)
                        .filter(|i| aggregator.claim_visit(&format!("url-{i}")))
                        .count()
                })
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 100);
        assert_eq!(aggregator.stats().duplicates, 15 * 100);
    }

    #[test]
    fn test_take_report_collects_records() {
        let aggregator = Aggregator::new("root");
        aggregator.record_document(ParsedDocument::new("root"));
        aggregator.record(Record::Error("Error parsing x: boom".to_string()));
        aggregator.note_pruned();
        aggregator.note_cache_hit();

        let report = aggregator.take_report();
        assert_eq!(report.root_page, "root");
        assert_eq!(report.all_claims.len(), 1);
        assert_eq!(report.errors, vec!["Error parsing x: boom".to_string()]);
        assert_eq!(report.stats.pruned, 1);
        assert_eq!(report.stats.cache_hits, 1);

        let empty = aggregator.take_report();
        assert_eq!(empty.root_page, "root");
        assert!(empty.all_claims.is_empty());
    }
}
