//! Search engine client trait definition.
//!
//! This module defines the abstract interface for search engine operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::SearchError;
use transaction_search_shared::{SearchFilter, TransactionDocument};

/// Outcome of a bulk write request that reached the engine.
///
/// A bulk request can be accepted by the engine and still fail for some or
/// all of its items; `errors` carries that per-item verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkWriteResponse {
    /// Whether any item in the request failed.
    pub errors: bool,
    /// Number of items the engine reported on.
    pub items: usize,
    /// Human-readable diagnostic for operators. Empty when nothing failed.
    pub diagnostic: String,
}

impl BulkWriteResponse {
    /// A response for a fully successful bulk write of `items` documents.
    pub fn success(items: usize) -> Self {
        Self {
            errors: false,
            items,
            diagnostic: String::new(),
        }
    }

    /// A response for a bulk write with failed items.
    pub fn failed(items: usize, diagnostic: impl Into<String>) -> Self {
        Self {
            errors: true,
            items,
            diagnostic: diagnostic.into(),
        }
    }
}

/// One page of a scrolled search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollPage {
    /// Documents on this page, in engine order.
    pub records: Vec<TransactionDocument>,
    /// Token used to request the next page or release the scroll context.
    pub scroll_id: String,
}

impl ScrollPage {
    /// Create a new scroll page.
    pub fn new(records: Vec<TransactionDocument>, scroll_id: impl Into<String>) -> Self {
        Self {
            records,
            scroll_id: scroll_id.into(),
        }
    }

    /// Whether this page holds no documents, which ends a scroll.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Abstract interface for search engine operations.
///
/// This trait defines all the operations the service needs from a search engine.
/// Implementations can be swapped for different backends (OpenSearch, mock, etc.)
/// enabling easy testing.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`; a single client is shared by
/// every request.
///
/// # Error Handling
///
/// All methods return `Result<T, SearchError>` for consistent error handling.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Write a batch of documents in a single bulk request.
    ///
    /// # Returns
    ///
    /// * `Ok(BulkWriteResponse)` - The request reached the engine; check `errors`
    /// * `Err(SearchError::BulkIndexError)` - The request itself could not be executed
    async fn bulk_write(
        &self,
        documents: &[TransactionDocument],
    ) -> Result<BulkWriteResponse, SearchError>;

    /// Open a scroll over all documents matching `filter`.
    ///
    /// # Arguments
    ///
    /// * `filter` - The filter to execute
    /// * `page_size` - Maximum number of documents per page
    /// * `scroll_timeout` - How long the engine keeps the scroll context alive
    ///
    /// # Returns
    ///
    /// * `Ok(ScrollPage)` - The first page and its scroll id
    /// * `Err(SearchError)` - If the search fails
    async fn search(
        &self,
        filter: &SearchFilter,
        page_size: usize,
        scroll_timeout: Duration,
    ) -> Result<ScrollPage, SearchError>;

    /// Fetch the page following the one that returned `scroll_id`.
    async fn fetch_next_page(
        &self,
        scroll_id: &str,
        scroll_timeout: Duration,
    ) -> Result<ScrollPage, SearchError>;

    /// Release the server-side scroll context identified by `scroll_id`.
    async fn release_context(&self, scroll_id: &str) -> Result<(), SearchError>;

    /// Ensure the transaction index exists with proper mappings.
    ///
    /// If the index doesn't exist, it will be created with a text field and
    /// a `keyword` sub-field for each document property.
    ///
    /// This should be called during application startup.
    async fn ensure_index_exists(&self) -> Result<(), SearchError>;

    /// Check if the search engine is healthy and reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the search engine is healthy
    /// * `Ok(false)` - If the search engine is unhealthy
    /// * `Err(SearchError)` - If the health check fails to execute
    async fn health_check(&self) -> Result<bool, SearchError>;
}
