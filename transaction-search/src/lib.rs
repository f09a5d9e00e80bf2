//! # Transaction Search
//!
//! HTTP service for bulk ingestion and classified search of transaction
//! records.
//!
//! This crate provides the configuration, dependency wiring and HTTP surface
//! around the transaction search pipeline.

pub mod config;
pub mod http;

pub use config::{Dependencies, LogFormat, Settings};

use thiserror::Error;

/// Errors that can occur during service initialization or execution.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] transaction_search_pipeline::PipelineError),

    /// Search error.
    #[error("Search error: {0}")]
    Search(#[from] transaction_search_repository::SearchError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
