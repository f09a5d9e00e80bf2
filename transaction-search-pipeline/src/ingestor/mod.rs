//! Ingestor module for the transaction search pipeline.
//!
//! Writes a stream of uploaded records to the search index in fixed-size
//! bulk batches.

mod batch;

use std::pin::pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::errors::PipelineError;
use batch::Batch;
use transaction_search_repository::SearchEngineClient;
use transaction_search_shared::{TransactionDocument, DEFAULT_BATCH_SIZE};

/// Configuration for the batch ingestor.
#[derive(Debug, Clone)]
pub struct IngestorConfig {
    /// Number of records per bulk request.
    pub batch_size: usize,
}

impl Default for IngestorConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// A bulk request the engine did not fully accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// 1-based position of the batch within the ingestion call.
    pub batch_index: usize,
    /// Number of records in the batch.
    pub count: usize,
    /// Engine diagnostic for the failure.
    pub diagnostic: String,
}

/// Outcome of one ingestion call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Records submitted to the engine, across all batches.
    pub records: usize,
    /// Bulk requests submitted.
    pub batches: usize,
    /// Batches that reported errors, in submission order.
    pub failed_batches: Vec<BatchFailure>,
}

impl IngestSummary {
    /// Whether every batch was accepted.
    pub fn is_success(&self) -> bool {
        self.failed_batches.is_empty()
    }

    /// Records that were part of a failed batch.
    pub fn failed_records(&self) -> usize {
        self.failed_batches.iter().map(|f| f.count).sum()
    }
}

/// Ingestor that writes records into the search engine.
///
/// The ingestor is responsible for:
/// - Skipping empty (`None`) elements of the source
/// - Batching records into bulk requests of `batch_size`
/// - Logging, but not retrying, failed batches
///
/// Batches are submitted one at a time, in input order, and the source is
/// not polled while a bulk request is in flight.
pub struct BatchIngestor {
    client: Arc<dyn SearchEngineClient>,
    config: IngestorConfig,
}

impl BatchIngestor {
    /// Create a new ingestor with the given client.
    pub fn new(client: Arc<dyn SearchEngineClient>) -> Self {
        Self {
            client,
            config: IngestorConfig::default(),
        }
    }

    /// Create a new ingestor with custom configuration.
    pub fn with_config(
        client: Arc<dyn SearchEngineClient>,
        config: IngestorConfig,
    ) -> Result<Self, PipelineError> {
        if config.batch_size == 0 {
            return Err(PipelineError::config("batch_size must be greater than zero"));
        }
        Ok(Self { client, config })
    }

    /// Get the ingestor configuration.
    pub fn config(&self) -> &IngestorConfig {
        &self.config
    }

    /// Consume `source` and write its records in batches.
    ///
    /// A failed batch is logged and recorded in the summary; it does not stop
    /// the remaining input. A source error aborts the call. Cancellation
    /// aborts the call without flushing the partial trailing batch.
    #[instrument(skip(self, source, cancel), fields(ingestion_id = %Uuid::new_v4()))]
    pub async fn ingest<S>(
        &self,
        source: S,
        cancel: &CancellationToken,
    ) -> Result<IngestSummary, PipelineError>
    where
        S: Stream<Item = Result<Option<TransactionDocument>, PipelineError>> + Send,
    {
        info!(batch_size = self.config.batch_size, "Starting batch ingestion");

        let mut source = pin!(source);
        let mut batch = Batch::with_capacity(self.config.batch_size);
        let mut summary = IngestSummary::default();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(pending = batch.len(), "Batch ingestion cancelled");
                    return Err(PipelineError::Cancelled);
                }
                next = source.next() => next,
            };

            let record = match next {
                Some(Ok(Some(record))) => record,
                Some(Ok(None)) => continue,
                Some(Err(e)) => {
                    error!(error = %e, batches = summary.batches, "Failed to read ingestion source");
                    return Err(e);
                }
                None => break,
            };

            batch.push(record);

            if batch.is_full() {
                self.submit(batch.take(), &mut summary, cancel).await?;
            }
        }

        if !batch.is_empty() {
            self.submit(batch.take(), &mut summary, cancel).await?;
        }

        info!(
            records = summary.records,
            batches = summary.batches,
            failed_batches = summary.failed_batches.len(),
            "Finished batch ingestion"
        );

        Ok(summary)
    }

    /// Send one batch and record its outcome.
    async fn submit(
        &self,
        records: Vec<TransactionDocument>,
        summary: &mut IngestSummary,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        let batch_index = summary.batches + 1;
        let count = records.len();

        info!(batch = batch_index, count, "Sending bulk request");

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(batch = batch_index, count, "Bulk request cancelled");
                return Err(PipelineError::Cancelled);
            }
            result = self.client.bulk_write(&records) => result,
        };

        summary.batches = batch_index;
        summary.records += count;

        let diagnostic = match result {
            Ok(response) if !response.errors => {
                debug!(batch = batch_index, items = response.items, "Bulk request succeeded");
                return Ok(());
            }
            Ok(response) => response.diagnostic,
            Err(e) => e.to_string(),
        };

        error!(
            batch = batch_index,
            count,
            error = %diagnostic,
            "Bulk request failed"
        );

        summary.failed_batches.push(BatchFailure {
            batch_index,
            count,
            diagnostic,
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{record, MockEngine};
    use futures::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn records(n: usize) -> impl Stream<Item = Result<Option<TransactionDocument>, PipelineError>> {
        stream::iter((0..n).map(|i| Ok(Some(record(i)))))
    }

    #[tokio::test]
    async fn test_batch_sizing() {
        for (n, expected) in [
            (0, vec![]),
            (1, vec![1]),
            (999, vec![999]),
            (1000, vec![1000]),
            (1001, vec![1000, 1]),
            (2500, vec![1000, 1000, 500]),
            (3000, vec![1000, 1000, 1000]),
        ] {
            let client = Arc::new(MockEngine::new());
            let ingestor = BatchIngestor::new(client.clone());

            let summary = ingestor
                .ingest(records(n), &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(client.batch_sizes().await, expected, "n = {}", n);
            assert_eq!(summary.records, n);
            assert_eq!(summary.batches, expected.len());
            assert!(summary.is_success());
        }
    }

    #[tokio::test]
    async fn test_batches_preserve_input_order() {
        let client = Arc::new(MockEngine::new());
        let ingestor = BatchIngestor::new(client.clone());

        ingestor
            .ingest(records(2100), &CancellationToken::new())
            .await
            .unwrap();

        let submitted: Vec<TransactionDocument> =
            client.bulk_calls.lock().await.concat();
        let expected: Vec<TransactionDocument> = (0..2100).map(record).collect();
        assert_eq!(submitted, expected);
    }

    #[tokio::test]
    async fn test_null_elements_are_skipped() {
        let client = Arc::new(MockEngine::new());
        let ingestor = BatchIngestor::new(client.clone());

        // 1500 records with a None after every record
        let source = stream::iter(
            (0..1500).flat_map(|i| [Ok(Some(record(i))), Ok(None)]),
        );

        let summary = ingestor
            .ingest(source, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(client.batch_sizes().await, vec![1000, 500]);
        assert_eq!(summary.records, 1500);

        let submitted = client.bulk_calls.lock().await.concat();
        assert_eq!(submitted, (0..1500).map(record).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_only_nulls_submits_nothing() {
        let client = Arc::new(MockEngine::new());
        let ingestor = BatchIngestor::new(client.clone());

        let source = stream::iter((0..5000).map(|_| Ok(None)));
        let summary = ingestor
            .ingest(source, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(client.engine_calls(), 0);
        assert_eq!(summary, IngestSummary::default());
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_stop_ingestion() {
        let client = Arc::new(MockEngine::new().failing_batches(&[2]));
        let ingestor = BatchIngestor::new(client.clone());

        let summary = ingestor
            .ingest(records(2500), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(client.batch_sizes().await, vec![1000, 1000, 500]);
        assert_eq!(summary.batches, 3);
        assert_eq!(summary.failed_batches.len(), 1);
        assert_eq!(summary.failed_batches[0].batch_index, 2);
        assert_eq!(summary.failed_batches[0].count, 1000);
        assert!(summary.failed_batches[0]
            .diagnostic
            .contains("mapper_parsing_exception"));
        assert_eq!(summary.failed_records(), 1000);
    }

    #[tokio::test]
    async fn test_bulk_request_error_is_recorded_as_failure() {
        let client = Arc::new(MockEngine::new().erroring_batches(&[1]));
        let ingestor = BatchIngestor::new(client.clone());

        let summary = ingestor
            .ingest(records(1200), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(client.batch_sizes().await, vec![1000, 200]);
        assert_eq!(summary.failed_batches.len(), 1);
        assert!(summary.failed_batches[0].diagnostic.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_malformed_element_aborts_ingestion() {
        let client = Arc::new(MockEngine::new());
        let ingestor = BatchIngestor::new(client.clone());

        let source = stream::iter(
            (0..1200)
                .map(|i| {
                    if i == 1100 {
                        Err(PipelineError::malformed("expected value at line 1"))
                    } else {
                        Ok(Some(record(i)))
                    }
                })
                .collect::<Vec<_>>(),
        );

        let result = ingestor.ingest(source, &CancellationToken::new()).await;

        assert!(matches!(result, Err(PipelineError::MalformedInput(_))));
        // The full first batch went out before the bad element was read
        assert_eq!(client.batch_sizes().await, vec![1000]);
    }

    #[tokio::test]
    async fn test_cancellation_skips_trailing_flush() {
        let client = Arc::new(MockEngine::new());
        let ingestor = BatchIngestor::new(client.clone());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        let source = stream::iter(0..2000).map(move |i| {
            if i == 1500 {
                trigger.cancel();
            }
            Ok(Some(record(i)))
        });

        let result = ingestor.ingest(source, &cancel).await;

        assert!(matches!(result, Err(PipelineError::Cancelled)));
        assert_eq!(client.batch_sizes().await, vec![1000]);
    }

    #[tokio::test]
    async fn test_source_is_not_polled_during_bulk_write() {
        let polls = Arc::new(AtomicUsize::new(0));
        let mut engine = MockEngine::new();
        engine.source_polls = Some(polls.clone());
        let client = Arc::new(engine);
        let ingestor = BatchIngestor::new(client.clone());

        let counter = polls.clone();
        let source = stream::iter(0..2500).map(move |i| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Some(record(i)))
        });

        ingestor
            .ingest(source, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            *client.polls_during_bulk.lock().await,
            vec![(1000, 1000), (2000, 2000), (2500, 2500)]
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let client = Arc::new(MockEngine::new());
        let ingestor = BatchIngestor::new(client.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = ingestor.ingest(records(10), &cancel).await;

        assert!(matches!(result, Err(PipelineError::Cancelled)));
        assert_eq!(client.engine_calls(), 0);
    }

    #[tokio::test]
    async fn test_custom_batch_size() {
        let client = Arc::new(MockEngine::new());
        let ingestor =
            BatchIngestor::with_config(client.clone(), IngestorConfig { batch_size: 3 }).unwrap();

        ingestor
            .ingest(records(7), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(client.batch_sizes().await, vec![3, 3, 1]);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let client = Arc::new(MockEngine::new());
        let result = BatchIngestor::with_config(client, IngestorConfig { batch_size: 0 });

        assert!(matches!(result, Err(PipelineError::Config(_))));
    }
}
