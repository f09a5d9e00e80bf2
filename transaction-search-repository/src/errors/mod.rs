//! Error types for the transaction search repository.

mod search_error;

pub use search_error::SearchError;
