//! Stub search engine for the HTTP tests.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use transaction_search_pipeline::{BatchIngestor, QueryRouter, ScrollConfig};
use transaction_search_repository::{
    BulkWriteResponse, ScrollPage, SearchEngineClient, SearchError,
};
use transaction_search_shared::{SearchFilter, TransactionDocument};

use super::{AppState, QueryCache};

pub fn record(i: usize) -> TransactionDocument {
    TransactionDocument::new(
        "31/12/2024",
        format!("{}.{:02}", 10000 + i, i % 100),
        "1.234.000",
        format!("Payment For Rent {}", i),
    )
}

/// Engine that serves one page of `hits` records per search.
#[derive(Default)]
pub struct StubEngine {
    pub hits: usize,
    pub fail_search: bool,
    pub unhealthy: bool,
    pub indexed: Mutex<Vec<TransactionDocument>>,
    pub searches: AtomicUsize,
    pub released: AtomicUsize,
}

impl StubEngine {
    pub fn with_hits(hits: usize) -> Self {
        Self {
            hits,
            ..Self::default()
        }
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchEngineClient for StubEngine {
    async fn bulk_write(
        &self,
        documents: &[TransactionDocument],
    ) -> Result<BulkWriteResponse, SearchError> {
        self.indexed.lock().extend_from_slice(documents);
        Ok(BulkWriteResponse::success(documents.len()))
    }

    async fn search(
        &self,
        _filter: &SearchFilter,
        _page_size: usize,
        _scroll_timeout: Duration,
    ) -> Result<ScrollPage, SearchError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.fail_search {
            return Err(SearchError::connection("connection refused"));
        }
        Ok(ScrollPage::new((0..self.hits).map(record).collect(), "s1"))
    }

    async fn fetch_next_page(
        &self,
        _scroll_id: &str,
        _scroll_timeout: Duration,
    ) -> Result<ScrollPage, SearchError> {
        Ok(ScrollPage::new(Vec::new(), "s2"))
    }

    async fn release_context(&self, _scroll_id: &str) -> Result<(), SearchError> {
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn ensure_index_exists(&self) -> Result<(), SearchError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        Ok(!self.unhealthy)
    }
}

/// Build the application state around `engine` with default settings.
pub fn state(engine: Arc<StubEngine>) -> AppState {
    let client: Arc<dyn SearchEngineClient> = engine;
    AppState {
        ingestor: Arc::new(BatchIngestor::new(client.clone())),
        router: Arc::new(QueryRouter::new(client.clone(), ScrollConfig::default())),
        client,
        cache: Arc::new(QueryCache::new(
            NonZeroUsize::new(16).unwrap(),
            Duration::from_secs(86_400),
        )),
    }
}
