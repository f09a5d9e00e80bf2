//! Dependency initialization and wiring for the transaction search service.

use std::sync::Arc;
use tracing::info;

use crate::config::Settings;
use crate::http::{AppState, QueryCache};
use crate::AppError;
use transaction_search_pipeline::{BatchIngestor, IngestorConfig, QueryRouter, ScrollConfig};
use transaction_search_repository::{IndexConfig, OpenSearchClient, SearchEngineClient};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// Shared state handed to the HTTP router.
    pub state: AppState,
}

impl Dependencies {
    /// Initialize all dependencies from `settings`.
    ///
    /// Connects to OpenSearch, verifies the cluster is healthy and creates
    /// the index if needed before building the pipeline components.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(AppError)` - If initialization fails
    pub async fn new(settings: &Settings) -> Result<Self, AppError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            index = %settings.index_name,
            batch_size = settings.batch_size,
            page_size = settings.page_size,
            "Initializing dependencies"
        );

        // Initialize OpenSearch client
        let search_client =
            OpenSearchClient::new(&settings.opensearch_url, IndexConfig::new(&settings.index_name))
                .await
                .map_err(|e| AppError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        // Verify OpenSearch is reachable
        let healthy = search_client
            .health_check()
            .await
            .map_err(|e| AppError::config(format!("OpenSearch health check failed: {}", e)))?;

        if !healthy {
            return Err(AppError::config("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");

        search_client.ensure_index_exists().await?;

        let client: Arc<dyn SearchEngineClient> = Arc::new(search_client);

        let ingestor = BatchIngestor::with_config(
            client.clone(),
            IngestorConfig {
                batch_size: settings.batch_size,
            },
        )?;

        let router = QueryRouter::new(
            client.clone(),
            ScrollConfig {
                page_size: settings.page_size,
                scroll_timeout: settings.scroll_timeout,
            },
        );

        let cache = QueryCache::new(settings.cache_capacity, settings.cache_ttl);

        Ok(Self {
            state: AppState {
                ingestor: Arc::new(ingestor),
                router: Arc::new(router),
                client,
                cache: Arc::new(cache),
            },
        })
    }
}
