//! Claim extractor implementations.
//!
//! - `OpenAIExtractor` - OpenAI chat completions (requires `openai` feature)
//!
//! For tests, see [`MockExtractor`](crate::testing::MockExtractor).

mod openai;

pub use openai::OpenAIExtractor;
