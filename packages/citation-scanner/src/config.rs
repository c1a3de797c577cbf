//! Scanner configuration loaded from environment variables.
//!
//! Uses the `secrecy` crate so the API key never shows up in logs or
//! debug output.

use dotenvy::dotenv;
use secrecy::{ExposeSecret, SecretBox};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::config::TraversalConfig;

/// Default chat model for the OpenAI extractor.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Default OpenAI API base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default SQLite cache location (created if missing).
pub const DEFAULT_CACHE_DATABASE_URL: &str = "sqlite://cache.db?mode=rwc";

/// A secret string that won't be logged or displayed.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    /// Create a new secret string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the secret value for use.
    ///
    /// Only call this when actually using the secret (e.g., in an API request).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Everything needed to wire a scanner from the environment.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Only required by the OpenAI extractor
    pub openai_api_key: Option<SecretString>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub cache_database_url: String,
    pub cache_ttl: Duration,
    pub traversal: TraversalConfig,
    pub fetch_timeout: Duration,
    pub fetch_requests_per_second: Option<u32>,
    pub fetch_user_agent: Option<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            cache_database_url: DEFAULT_CACHE_DATABASE_URL.to_string(),
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            traversal: TraversalConfig::default(),
            fetch_timeout: Duration::from_secs(30),
            fetch_requests_per_second: None,
            fetch_user_agent: None,
        }
    }
}

impl ScannerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&'static str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut traversal = TraversalConfig::new();
        if let Some(limit) = parse_var::<usize>(&var, "SCAN_MAX_CONCURRENCY")? {
            traversal = traversal.with_max_concurrency(limit);
        }
        if let Some(secs) = parse_var::<u64>(&var, "SCAN_DOCUMENT_TIMEOUT_SECS")? {
            traversal = traversal.with_document_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            openai_api_key: var("OPENAI_API_KEY").map(SecretString::from),
            openai_model: var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_base_url: var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            cache_database_url: var("CACHE_DATABASE_URL").unwrap_or(defaults.cache_database_url),
            cache_ttl: parse_var::<u64>(&var, "CACHE_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            traversal,
            fetch_timeout: parse_var::<u64>(&var, "FETCH_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
            fetch_requests_per_second: parse_var::<u32>(&var, "FETCH_REQUESTS_PER_SECOND")?
                .filter(|rps| *rps > 0),
            fetch_user_agent: var("FETCH_USER_AGENT"),
        })
    }

    /// The API key, or an error naming the missing variable.
    pub fn require_api_key(&self) -> Result<&SecretString, ConfigError> {
        self.openai_api_key
            .as_ref()
            .ok_or(ConfigError::Missing("OPENAI_API_KEY"))
    }
}

fn parse_var<T: FromStr>(
    var: &impl Fn(&'static str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    let Some(value) = var(name) else {
        return Ok(None);
    };
    match value.trim().parse() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&'static str, &str)]) -> Result<ScannerConfig, ConfigError> {
        let vars: HashMap<&str, String> = vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        ScannerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert!(config.openai_api_key.is_none());
        assert_eq!(config.openai_model, "gpt-4o");
        assert_eq!(config.cache_database_url, DEFAULT_CACHE_DATABASE_URL);
        assert_eq!(config.cache_ttl, Duration::from_secs(86_400));
        assert_eq!(config.traversal, TraversalConfig::default());
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert!(config.fetch_requests_per_second.is_none());
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::Missing("OPENAI_API_KEY"))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("CACHE_TTL_SECS", "60"),
            ("SCAN_MAX_CONCURRENCY", "8"),
            ("SCAN_DOCUMENT_TIMEOUT_SECS", "120"),
            ("FETCH_REQUESTS_PER_SECOND", "5"),
        ])
        .unwrap();

        assert_eq!(config.require_api_key().unwrap().expose(), "sk-test");
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.traversal.max_concurrency, Some(8));
        assert_eq!(
            config.traversal.document_timeout,
            Some(Duration::from_secs(120))
        );
        assert_eq!(config.fetch_requests_per_second, Some(5));
    }

    #[test]
    fn test_invalid_number_names_the_variable() {
        let err = load(&[("CACHE_TTL_SECS", "a day")]).unwrap_err();
        assert_eq!(err.to_string(), "CACHE_TTL_SECS is invalid: a day");
    }

    #[test]
    fn test_api_key_is_redacted() {
        let config = load(&[("OPENAI_API_KEY", "sk-secret")]).unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
