//! # openapi-reducer
//!
//! Endpoint resolution for commerce-agent.
//! Flattens OpenAPI documents into endpoint records, picks the endpoint that
//! answers a natural-language action, and renders docs for `METHOD /path` queries.

mod types;
mod loader;
mod reducer;
mod dereference;
mod matcher;
mod extractor;
mod cache;
mod error;

pub use types::*;
pub use loader::{SpecLoader, SpecSource, DEFAULT_FETCH_TIMEOUT};
pub use reducer::SpecReducer;
pub use dereference::Dereferencer;
pub use matcher::{EndpointMatcher, MatchPrompt, OpenAiConfig, OpenAiMatcher, TextMatcher};
pub use extractor::SpecExtractor;
pub use cache::SpecCache;
pub use error::{SpecError, SpecResult};
