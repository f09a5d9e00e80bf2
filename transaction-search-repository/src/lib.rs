//! # Transaction Search Repository
//!
//! This crate provides the trait the service uses to talk to the search
//! engine, the response types it returns, and a concrete implementation for
//! OpenSearch.

pub mod errors;
pub mod interfaces;
pub mod opensearch;

pub use errors::SearchError;
pub use interfaces::{BulkWriteResponse, ScrollPage, SearchEngineClient};
pub use opensearch::{IndexConfig, OpenSearchClient, DEFAULT_INDEX_NAME};
