//! Collaborator abstractions consumed by the traversal engine.
//!
//! Applications implement these to plug in content retrieval,
//! claim extraction, and result caching.

pub mod cache;
pub mod extractor;
pub mod fetcher;
