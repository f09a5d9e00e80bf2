//! Scripted search engine client shared by the pipeline tests.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use transaction_search_repository::{
    BulkWriteResponse, ScrollPage, SearchEngineClient, SearchError,
};
use transaction_search_shared::{SearchFilter, TransactionDocument};

/// Build a distinguishable test record.
pub fn record(i: usize) -> TransactionDocument {
    TransactionDocument::new(
        "01/01/2024",
        format!("{}.{:02}", 1000 + i % 9000, i % 100),
        format!("{}.000", i),
        format!("transfer {}", i),
    )
}

/// Build a scroll page of `size` records.
pub fn page(size: usize, scroll_id: &str) -> ScrollPage {
    ScrollPage::new((0..size).map(record).collect(), scroll_id)
}

/// Mock search engine that records every call and replays scripted pages.
#[derive(Default)]
pub struct MockEngine {
    /// Records of each bulk write, in call order.
    pub bulk_calls: Mutex<Vec<Vec<TransactionDocument>>>,
    /// 1-based bulk call numbers that report item errors.
    pub failing_batches: HashSet<usize>,
    /// 1-based bulk call numbers whose request fails outright.
    pub erroring_batches: HashSet<usize>,
    /// Filters passed to `search`.
    pub search_calls: Mutex<Vec<SearchFilter>>,
    /// Scroll ids passed to `fetch_next_page`.
    pub next_page_calls: Mutex<Vec<String>>,
    /// Scroll ids passed to `release_context`.
    pub released: Mutex<Vec<String>>,
    /// Pages returned by `search` then `fetch_next_page`, in order.
    pub pages: Mutex<VecDeque<Result<ScrollPage, SearchError>>>,
    /// When set, `fetch_next_page` cancels this token and never returns.
    pub cancel_on_next_page: Option<CancellationToken>,
    /// When set, `release_context` fails.
    pub fail_release: bool,
    /// Counter of source elements pulled, read around each bulk write.
    pub source_polls: Option<Arc<AtomicUsize>>,
    /// `source_polls` at the start and end of each bulk write.
    pub polls_during_bulk: Mutex<Vec<(usize, usize)>>,
    engine_calls: AtomicUsize,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(pages: Vec<Result<ScrollPage, SearchError>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            ..Self::default()
        }
    }

    pub fn failing_batches(mut self, batches: &[usize]) -> Self {
        self.failing_batches = batches.iter().copied().collect();
        self
    }

    pub fn erroring_batches(mut self, batches: &[usize]) -> Self {
        self.erroring_batches = batches.iter().copied().collect();
        self
    }

    /// Total number of calls made against the engine.
    pub fn engine_calls(&self) -> usize {
        self.engine_calls.load(Ordering::SeqCst)
    }

    /// Sizes of every bulk write, in call order.
    pub async fn batch_sizes(&self) -> Vec<usize> {
        self.bulk_calls.lock().await.iter().map(Vec::len).collect()
    }

    async fn next_page(&self) -> Result<ScrollPage, SearchError> {
        self.pages
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(ScrollPage::new(vec![], "exhausted")))
    }
}

#[async_trait]
impl SearchEngineClient for MockEngine {
    async fn bulk_write(
        &self,
        documents: &[TransactionDocument],
    ) -> Result<BulkWriteResponse, SearchError> {
        self.engine_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(polls) = &self.source_polls {
            let before = polls.load(Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            tokio::task::yield_now().await;
            let after = polls.load(Ordering::SeqCst);
            self.polls_during_bulk.lock().await.push((before, after));
        }

        let mut calls = self.bulk_calls.lock().await;
        calls.push(documents.to_vec());
        let call = calls.len();

        if self.erroring_batches.contains(&call) {
            return Err(SearchError::bulk_index("connection reset"));
        }
        if self.failing_batches.contains(&call) {
            return Ok(BulkWriteResponse::failed(
                documents.len(),
                "1 of 1000 items failed: [mapper_parsing_exception] failed to parse",
            ));
        }
        Ok(BulkWriteResponse::success(documents.len()))
    }

    async fn search(
        &self,
        filter: &SearchFilter,
        _page_size: usize,
        _scroll_timeout: Duration,
    ) -> Result<ScrollPage, SearchError> {
        self.engine_calls.fetch_add(1, Ordering::SeqCst);
        self.search_calls.lock().await.push(filter.clone());
        self.next_page().await
    }

    async fn fetch_next_page(
        &self,
        scroll_id: &str,
        _scroll_timeout: Duration,
    ) -> Result<ScrollPage, SearchError> {
        self.engine_calls.fetch_add(1, Ordering::SeqCst);
        self.next_page_calls.lock().await.push(scroll_id.to_string());

        if let Some(token) = &self.cancel_on_next_page {
            token.cancel();
            std::future::pending::<()>().await;
        }

        self.next_page().await
    }

    async fn release_context(&self, scroll_id: &str) -> Result<(), SearchError> {
        self.engine_calls.fetch_add(1, Ordering::SeqCst);
        self.released.lock().await.push(scroll_id.to_string());

        if self.fail_release {
            return Err(SearchError::scroll("clear scroll rejected"));
        }
        Ok(())
    }

    async fn ensure_index_exists(&self) -> Result<(), SearchError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        Ok(true)
    }
}
