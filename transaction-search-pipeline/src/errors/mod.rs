//! Error types for the transaction search pipeline.

use thiserror::Error;
use transaction_search_repository::SearchError;

/// Errors that can occur in the transaction search pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The upload could not be decoded into transaction records.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A search page could not be fetched.
    #[error("Search execution error: {0}")]
    SearchExecution(#[from] SearchError),

    /// Invalid component configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The operation was cancelled before it completed.
    #[error("Operation cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Create a malformed input error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedInput(err.to_string())
    }
}
