//! Query router for the transaction search pipeline.
//!
//! Turns a raw query string into a field-specific filter and hands it to the
//! paginator.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::errors::PipelineError;
use crate::paginator::{ScrollConfig, ScrollPaginator};
use transaction_search_repository::SearchEngineClient;
use transaction_search_shared::{classify, SearchFilter, TransactionDocument};

/// Routes queries to the field they target and returns every match.
pub struct QueryRouter {
    paginator: ScrollPaginator,
}

impl QueryRouter {
    /// Create a new router with the given client and scroll configuration.
    pub fn new(client: Arc<dyn SearchEngineClient>, config: ScrollConfig) -> Self {
        Self {
            paginator: ScrollPaginator::new(client, config),
        }
    }

    /// Search for `query` and return all matching records.
    ///
    /// An empty or all-whitespace query returns no records without touching
    /// the engine. The query is matched literally; classification never
    /// rewrites its value.
    #[instrument(skip(self, cancel), fields(query_len = query.len()))]
    pub async fn search(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<TransactionDocument>, PipelineError> {
        if query.trim().is_empty() {
            debug!("Empty query, skipping search");
            return Ok(Vec::new());
        }

        let field = classify(query);
        let filter = SearchFilter::for_field(field, query);
        debug!(
            ?field,
            structured = field.is_structured(),
            target = filter.field(),
            "Classified query"
        );

        let results = self.paginator.collect(&filter, cancel).await?;

        info!(?field, count = results.len(), "Search completed");
        Ok(results)
    }
}
