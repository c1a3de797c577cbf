//! Traversal pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Single-document parsing (fetch → extract → validate)
//! - The claim extraction prompt
//! - Cache-or-parse resolution
//! - Race-free aggregation of documents and failures
//! - Concurrent recursive traversal with dedup and a depth bound

pub mod aggregate;
pub mod parse;
pub mod prompts;
pub mod resolve;
pub mod traverse;

pub use aggregate::{Aggregator, Record, Visit};
pub use parse::{parse_claims_response, DocumentParser};
pub use prompts::{format_claims_prompt, CLAIMS_PROMPT};
pub use resolve::{load_cached, lookup_or_parse, resolve_document, store_cached, Origin, Resolved};
pub use traverse::CitationScanner;
