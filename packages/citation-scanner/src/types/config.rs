//! Configuration types for extraction and traversal.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default persona handed to the claim extractor.
pub const DEFAULT_SYSTEM_ROLE: &str = "You are an expert in extracting claims from articles.";

/// Fixed settings passed to the claim extractor on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Persona/instructions prefix (system message).
    pub system_role: String,

    /// Sampling temperature. Low values keep quotes verbatim.
    ///
    /// Default: 0.1.
    pub temperature: f32,

    /// Upper bound on the size of the extractor's output, in tokens.
    ///
    /// Default: 16300.
    pub max_output_tokens: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            system_role: DEFAULT_SYSTEM_ROLE.to_string(),
            temperature: 0.1,
            max_output_tokens: 16_300,
        }
    }
}

impl ExtractionConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the system role.
    pub fn with_system_role(mut self, role: impl Into<String>) -> Self {
        self.system_role = role.into();
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the output bound.
    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = max;
        self
    }
}

/// Scheduling knobs for a traversal.
///
/// Neither setting changes what a traversal reports for a well-behaved
/// graph; they only bound how much work runs at once and how long one
/// branch may take.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalConfig {
    /// Maximum documents resolved at the same time (None = unbounded).
    pub max_concurrency: Option<usize>,

    /// Time allowed to resolve one document (None = wait forever).
    pub document_timeout: Option<Duration>,
}

impl TraversalConfig {
    /// Create a new config (unbounded, no timeout).
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the number of documents resolved concurrently.
    ///
    /// A limit of zero is treated as one.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit.max(1));
        self
    }

    /// Give up on a document after `timeout`.
    pub fn with_document_timeout(mut self, timeout: Duration) -> Self {
        self.document_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.system_role, DEFAULT_SYSTEM_ROLE);
        assert!((config.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.max_output_tokens, 16_300);
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let config = TraversalConfig::new().with_max_concurrency(0);
        assert_eq!(config.max_concurrency, Some(1));
    }
}
