//! Paginator module for the transaction search pipeline.
//!
//! Drains a server-side scroll into a single result set.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

use crate::errors::PipelineError;
use transaction_search_repository::SearchEngineClient;
use transaction_search_shared::{
    SearchFilter, TransactionDocument, DEFAULT_PAGE_SIZE, DEFAULT_SCROLL_TIMEOUT_SECS,
};

/// Configuration for scrolled retrieval.
#[derive(Debug, Clone)]
pub struct ScrollConfig {
    /// Maximum number of records per page.
    pub page_size: usize,
    /// How long the engine keeps the scroll context alive between pages.
    pub scroll_timeout: Duration,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            scroll_timeout: Duration::from_secs(DEFAULT_SCROLL_TIMEOUT_SECS),
        }
    }
}

/// Runs a filter as a scroll and collects every page.
///
/// Pages are requested strictly one after another, each with the scroll id
/// of the last non-empty page. The first empty page ends the scroll, and the
/// context is released exactly once before returning.
pub struct ScrollPaginator {
    client: Arc<dyn SearchEngineClient>,
    config: ScrollConfig,
}

impl ScrollPaginator {
    /// Create a new paginator with the given client and configuration.
    pub fn new(client: Arc<dyn SearchEngineClient>, config: ScrollConfig) -> Self {
        Self { client, config }
    }

    /// Get the scroll configuration.
    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    /// Execute `filter` and return all matching records in engine order.
    ///
    /// Any page failure fails the whole call with
    /// `PipelineError::SearchExecution`; the context is still released on a
    /// best-effort basis. On cancellation no release is attempted.
    #[instrument(skip(self, filter, cancel), fields(field = filter.field()))]
    pub async fn collect(
        &self,
        filter: &SearchFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<TransactionDocument>, PipelineError> {
        let first = until_cancelled(
            cancel,
            self.client
                .search(filter, self.config.page_size, self.config.scroll_timeout),
        )
        .await?
        .map_err(|e| {
            error!(error = %e, "Search request failed");
            PipelineError::SearchExecution(e)
        })?;

        let mut has_more = !first.is_empty();
        let mut scroll_id = first.scroll_id;
        let mut results = first.records;
        let mut pages = 1usize;

        while has_more {
            let next = until_cancelled(
                cancel,
                self.client
                    .fetch_next_page(&scroll_id, self.config.scroll_timeout),
            )
            .await?;

            match next {
                Ok(page) => {
                    pages += 1;
                    has_more = !page.is_empty();
                    if has_more {
                        scroll_id = page.scroll_id;
                        results.extend(page.records);
                    }
                    debug!(page = pages, total = results.len(), "Fetched scroll page");
                }
                Err(e) => {
                    error!(
                        error = %e,
                        page = pages + 1,
                        collected = results.len(),
                        "Scroll request failed"
                    );
                    self.release(&scroll_id, cancel).await;
                    return Err(PipelineError::SearchExecution(e));
                }
            }
        }

        self.release(&scroll_id, cancel).await;

        debug!(pages, total = results.len(), "Scroll exhausted");
        Ok(results)
    }

    /// Release the scroll context, logging rather than propagating failures.
    async fn release(&self, scroll_id: &str, cancel: &CancellationToken) {
        match until_cancelled(cancel, self.client.release_context(scroll_id)).await {
            Ok(Ok(())) => debug!("Released scroll context"),
            Ok(Err(e)) => warn!(error = %e, "Failed to release scroll context"),
            Err(_) => warn!("Cancelled before scroll context was released"),
        }
    }
}

/// Await `fut` unless `cancel` fires first.
async fn until_cancelled<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, PipelineError>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Cancelled),
        out = fut => Ok(out),
    }
}
