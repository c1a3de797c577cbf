//! Aggregate output of one traversal.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::types::document::ParsedDocument;

/// Everything one traversal discovered.
///
/// Entry order in `all_claims` and `errors` follows task completion and
/// is not meaningful; compare them as sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// URL the traversal started from
    pub root_page: String,

    /// One entry per successfully resolved document
    pub all_claims: Vec<ParsedDocument>,

    /// Human-readable branch failures, each naming its URL
    pub errors: Vec<String>,

    /// Counters collected along the way
    #[serde(default)]
    pub stats: TraversalStats,
}

impl AggregateReport {
    /// Create an empty report for a root URL.
    pub fn new(root_page: impl Into<String>) -> Self {
        Self {
            root_page: root_page.into(),
            ..Default::default()
        }
    }

    /// Find the entry for a document URL.
    pub fn document(&self, url: &str) -> Option<&ParsedDocument> {
        self.all_claims.iter().find(|d| d.page == url)
    }

    /// URLs of every document in the report.
    pub fn pages(&self) -> HashSet<&str> {
        self.all_claims.iter().map(|d| d.page.as_str()).collect()
    }

    /// Errors mentioning a given URL.
    pub fn errors_for<'a>(&'a self, url: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        self.errors.iter().filter(move |e| e.contains(url))
    }

    /// Total number of claims across all documents.
    pub fn claim_count(&self) -> usize {
        self.all_claims.iter().map(|d| d.claims.len()).sum()
    }

    /// Check if the traversal hit no errors.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Traversal counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalStats {
    /// Documents served from the result cache
    pub cache_hits: usize,

    /// Documents that had to be parsed
    pub cache_misses: usize,

    /// Discoveries dropped for exceeding the depth bound
    pub pruned: usize,

    /// Discoveries of an already-claimed URL
    pub duplicates: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::Claim;

    #[test]
    fn test_report_lookup_helpers() {
        let mut report = AggregateReport::new("a");
        report.all_claims.push(
            ParsedDocument::new("a").with_claim(Claim::new("one").with_source("b")),
        );
        report.all_claims.push(
            ParsedDocument::new("b")
                .with_parent("a")
                .with_claim(Claim::new("two"))
                .with_claim(Claim::new("three")),
        );
        report.errors.push("Error parsing c: boom".to_string());

        assert_eq!(report.document("b").map(|d| d.parent_url.as_str()), Some("a"));
        assert!(report.document("c").is_none());
        assert_eq!(report.pages(), HashSet::from(["a", "b"]));
        assert_eq!(report.claim_count(), 3);
        assert_eq!(report.errors_for("c").count(), 1);
        assert!(!report.is_success());
    }

    #[test]
    fn test_report_json_shape() {
        let report = AggregateReport::new("https://root.example");
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["root_page"], "https://root.example");
        assert!(json["all_claims"].as_array().unwrap().is_empty());
        assert!(json["errors"].as_array().unwrap().is_empty());
        assert_eq!(json["stats"]["pruned"], 0);
    }
}
