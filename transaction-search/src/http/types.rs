//! HTTP API request/response types.

use serde::{Deserialize, Serialize};

use transaction_search_pipeline::IngestSummary;

/// Message returned when an upload contains no files.
pub const NO_FILES_MESSAGE: &str = "No files were uploaded.";

/// Message returned when every uploaded file was ingested.
pub const INDEXED_MESSAGE: &str = "Documents indexed successfully.";

/// Query string of `GET /mttq`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// The raw query; a missing parameter is the empty query.
    #[serde(default)]
    pub query: String,
}

/// Body of a successful `POST /mttq`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexResponse {
    pub message: String,
    pub files: Vec<FileSummary>,
}

/// Ingestion outcome of one uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSummary {
    /// File name from the multipart part, if any.
    pub file_name: Option<String>,
    pub records: usize,
    pub batches: usize,
    pub failed_batches: Vec<FailedBatch>,
}

/// A bulk request of an upload the engine did not fully accept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedBatch {
    pub batch_index: usize,
    pub count: usize,
    pub diagnostic: String,
}

impl FileSummary {
    pub fn new(file_name: Option<String>, summary: IngestSummary) -> Self {
        Self {
            file_name,
            records: summary.records,
            batches: summary.batches,
            failed_batches: summary
                .failed_batches
                .into_iter()
                .map(|f| FailedBatch {
                    batch_index: f.batch_index,
                    count: f.count,
                    diagnostic: f.diagnostic,
                })
                .collect(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code
    pub error: String,
    /// Human-readable message
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new("bad_gateway", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new("unavailable", message)
    }
}
