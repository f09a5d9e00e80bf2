//! # Transaction Search Pipeline
//!
//! This crate provides the request-scoped components of the transaction
//! search service:
//!
//! 1. **Ingestor**: Writes a stream of uploaded records to the index in
//!    fixed-size bulk batches
//! 2. **Router**: Classifies a raw query and builds the matching filter
//! 3. **Paginator**: Drains a scroll over the filter into one result set
//!
//! Upload decoding (`source`) turns uploaded JSON into the record stream the
//! ingestor consumes. The components share only the injected
//! `SearchEngineClient`.

pub mod errors;
pub mod ingestor;
pub mod paginator;
pub mod router;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::PipelineError;
pub use ingestor::{BatchFailure, BatchIngestor, IngestSummary, IngestorConfig};
pub use paginator::{ScrollConfig, ScrollPaginator};
pub use router::QueryRouter;
pub use source::{decode_bytes, decode_stream, SourceItem};
