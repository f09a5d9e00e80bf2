//! # Transaction Search Shared
//!
//! Types shared by the ingestion and retrieval sides of the transaction
//! search service: the transaction record contract, the query classifier and
//! the engine-agnostic search filter.

pub mod classification;
pub mod document;
pub mod filter;

pub use classification::{classify, QueryField};
pub use document::TransactionDocument;
pub use filter::SearchFilter;

/// Number of records submitted per bulk write.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Number of records requested per scroll page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Lifetime of a server-side scroll context, in seconds.
pub const DEFAULT_SCROLL_TIMEOUT_SECS: u64 = 120;
