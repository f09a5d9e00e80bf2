//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchEngineClient`
//! using the OpenSearch Rust client.

use std::time::Duration;

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    http::response::Response,
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkParts, ClearScrollParts, OpenSearch, ScrollParts, SearchParts,
};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::errors::SearchError;
use crate::interfaces::{BulkWriteResponse, ScrollPage, SearchEngineClient};
use crate::opensearch::index_config::IndexConfig;
use crate::opensearch::queries::{
    build_bulk_body, build_clear_scroll_body, build_scroll_body, build_search_body,
    format_scroll_timeout, parse_hits, parse_scroll_id, summarize_bulk_errors,
};
use transaction_search_shared::{SearchFilter, TransactionDocument};

/// OpenSearch client implementation.
///
/// Wraps a single-node connection pool. The underlying transport is safe to
/// share between tasks, so one instance serves every request.
///
/// # Example
///
/// ```ignore
/// use transaction_search_repository::{IndexConfig, OpenSearchClient, SearchEngineClient};
///
/// let client = OpenSearchClient::new("http://localhost:9200", IndexConfig::new("transactions")).await?;
/// client.ensure_index_exists().await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index to read from and write to
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchError)` - If connection setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            index = %index_config.name,
            "Created OpenSearch client"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Read a page response, failing on non-success status codes.
    async fn read_page(response: Response, operation: &str) -> Result<ScrollPage, SearchError> {
        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, operation, "Scroll request failed");
            return Err(SearchError::query(format!(
                "{} failed with status {}: {}",
                operation, status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let records = parse_hits(&body)?;
        let scroll_id = parse_scroll_id(&body)?;

        Ok(ScrollPage::new(records, scroll_id))
    }
}

#[async_trait]
impl SearchEngineClient for OpenSearchClient {
    /// Index a batch of documents with one `_bulk` request.
    ///
    /// A non-success HTTP status is reported as a failed response rather than
    /// an error, so the caller can log the engine's diagnostic for the batch.
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn bulk_write(
        &self,
        documents: &[TransactionDocument],
    ) -> Result<BulkWriteResponse, SearchError> {
        let body = build_bulk_body(documents)?;

        let response = self
            .client
            .bulk(BulkParts::Index(&self.index_config.name))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::bulk_index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Ok(BulkWriteResponse::failed(
                documents.len(),
                format!("Bulk request failed with status {}: {}", status, error_body),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let has_errors = body.get("errors").and_then(|e| e.as_bool()).unwrap_or(false);
        if !has_errors {
            debug!(count = documents.len(), "Bulk request succeeded");
            return Ok(BulkWriteResponse::success(documents.len()));
        }

        let (failed, diagnostic) = summarize_bulk_errors(&body);
        debug!(failed, "Bulk request reported item errors");

        Ok(BulkWriteResponse::failed(documents.len(), diagnostic))
    }

    #[instrument(skip(self, filter), fields(field = filter.field()))]
    async fn search(
        &self,
        filter: &SearchFilter,
        page_size: usize,
        scroll_timeout: Duration,
    ) -> Result<ScrollPage, SearchError> {
        let scroll = format_scroll_timeout(scroll_timeout);
        let index = [self.index_config.name.as_str()];

        let response = self
            .client
            .search(SearchParts::Index(&index))
            .scroll(&scroll)
            .body(build_search_body(filter, page_size))
            .send()
            .await
            .map_err(|e| SearchError::query(e.to_string()))?;

        Self::read_page(response, "Search").await
    }

    async fn fetch_next_page(
        &self,
        scroll_id: &str,
        scroll_timeout: Duration,
    ) -> Result<ScrollPage, SearchError> {
        let response = self
            .client
            .scroll(ScrollParts::None)
            .body(build_scroll_body(scroll_id, scroll_timeout))
            .send()
            .await
            .map_err(|e| SearchError::scroll(e.to_string()))?;

        Self::read_page(response, "Scroll").await
    }

    async fn release_context(&self, scroll_id: &str) -> Result<(), SearchError> {
        let response = self
            .client
            .clear_scroll(ClearScrollParts::None)
            .body(build_clear_scroll_body(scroll_id))
            .send()
            .await
            .map_err(|e| SearchError::scroll(e.to_string()))?;

        let status = response.status_code();

        // 404 means the context already expired
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SearchError::scroll(format!(
                "Clear scroll failed with status {}: {}",
                status, error_body
            )));
        }

        debug!("Scroll context released");
        Ok(())
    }

    async fn ensure_index_exists(&self) -> Result<(), SearchError> {
        let index = [self.index_config.name.as_str()];

        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&index))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if exists.status_code().is_success() {
            debug!(index = %self.index_config.name, "Index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.index_config.name))
            .body(self.index_config.index_settings())
            .send()
            .await
            .map_err(|e| SearchError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();

            // Another instance may have created it in the meantime
            if error_body.contains("resource_already_exists_exception") {
                warn!(index = %self.index_config.name, "Index was created concurrently");
                return Ok(());
            }

            return Err(SearchError::index_creation(format!(
                "Index creation failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %self.index_config.name, "Created search index");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Ok(false);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let status = body.get("status").and_then(|s| s.as_str()).unwrap_or("red");
        debug!(status = %status, "Cluster health");

        Ok(matches!(status, "green" | "yellow"))
    }
}
