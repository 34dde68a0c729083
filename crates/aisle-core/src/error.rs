//! Error types for Aisle Core

use thiserror::Error;

/// Result type alias using Aisle Error
pub type Result<T> = std::result::Result<T, Error>;

/// Aisle error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Tool-specific errors
///
/// These never leave the dispatcher: each one becomes an `{"error": ...}`
/// payload the model can read.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("unknown tool")]
    NotFound(String),

    #[error("invalid input for {tool}: {detail}")]
    InvalidParams { tool: String, detail: String },

    #[error("{0}")]
    ExecutionFailed(String),

    #[error("{0}")]
    Rejected(String),
}

impl From<Error> for ToolError {
    fn from(err: Error) -> Self {
        match err {
            Error::Tool(inner) => inner,
            other => ToolError::ExecutionFailed(other.to_string()),
        }
    }
}
