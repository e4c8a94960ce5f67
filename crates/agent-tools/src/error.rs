//! Error types for agent-tools

use openapi_reducer::SpecError;
use thiserror::Error;

/// Result type alias for tool operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Tool layer error types
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("HTTP {status} - {body}")]
    HttpStatus { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
