//! Error types for spec loading, reduction and endpoint resolution

use thiserror::Error;

/// Result type alias for reducer operations
pub type SpecResult<T> = std::result::Result<T, SpecError>;

/// Spec resolution error types
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Failed to fetch OpenAPI spec: {0}")]
    FetchError(String),

    #[error("YAML parse error: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid OpenAPI spec format: {0}")]
    InvalidFormat(String),

    #[error("Invalid spec source: {0}")]
    InvalidSource(String),

    #[error("Failed to render endpoint docs: {0}")]
    RenderError(String),

    #[error("{0} endpoint does not exist.")]
    EndpointNotFound(String),

    #[error("{query} matches more than one endpoint: {}", candidates.join(", "))]
    AmbiguousMatch {
        query: String,
        candidates: Vec<String>,
    },

    #[error("Endpoint matcher failed: {0}")]
    MatcherError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
