//! HTTP API request handlers.
//!
//! Handlers map requests onto the pipeline components held in [`AppState`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use transaction_search_pipeline::{decode_stream, BatchIngestor, PipelineError, QueryRouter};
use transaction_search_repository::SearchEngineClient;

use super::cache::QueryCache;
use super::types::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ingestor: Arc<BatchIngestor>,
    pub router: Arc<QueryRouter>,
    pub client: Arc<dyn SearchEngineClient>,
    pub cache: Arc<QueryCache>,
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> Response {
    let healthy = match state.client.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            warn!(error = %e, "Health check failed");
            false
        }
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            healthy,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
        .into_response()
}

/// Search endpoint
///
/// Successful responses are cached by exact query string and marked
/// publicly cacheable for the cache lifetime.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let cache_control = cache_control(&state.cache);

    if let Some(body) = state.cache.get(&params.query) {
        debug!(query = %params.query, "Serving cached search response");
        return json_bytes(body, cache_control);
    }

    // Cancels the search if the client goes away mid-request
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let results = match state.router.search(&params.query, &cancel).await {
        Ok(results) => results,
        Err(e) => return pipeline_error(e),
    };

    let body = match serde_json::to_vec(&results) {
        Ok(body) => Bytes::from(body),
        Err(e) => {
            error!(error = %e, "Failed to serialize search results");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error(e.to_string())),
            )
                .into_response();
        }
    };

    state.cache.insert(&params.query, body.clone());
    json_bytes(body, cache_control)
}

/// Index documents endpoint
///
/// Every non-empty `application/json` part is streamed through the ingestor
/// as it arrives. Parts are ingested one after another, in form order, since
/// a part must be drained before the next can be read.
pub async fn index_documents(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    // Cancels ingestion if the client goes away mid-upload
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let mut parts = 0usize;
    let mut files = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return multipart_error(e),
        };
        parts += 1;

        let file_name = field.file_name().map(str::to_string);
        if !field.content_type().is_some_and(is_json_content_type) {
            debug!(file_name = ?file_name, "Skipping non-JSON part");
            continue;
        }

        info!(file_name = ?file_name, "Indexing uploaded file");

        let received = AtomicUsize::new(0);
        let body = field.inspect(|chunk| {
            if let Ok(chunk) = chunk {
                received.fetch_add(chunk.len(), Ordering::Relaxed);
            }
        });

        let summary = match state.ingestor.ingest(decode_stream(body), &cancel).await {
            Ok(summary) => summary,
            Err(e) => return pipeline_error(e),
        };

        if received.load(Ordering::Relaxed) == 0 {
            debug!(file_name = ?file_name, "Skipping empty part");
            continue;
        }

        files.push(FileSummary::new(file_name, summary));
    }

    if parts == 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(NO_FILES_MESSAGE)),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(IndexResponse {
            message: INDEXED_MESSAGE.to_string(),
            files,
        }),
    )
        .into_response()
}

fn is_json_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

fn cache_control(cache: &QueryCache) -> HeaderValue {
    HeaderValue::from_str(&format!("public, max-age={}", cache.ttl().as_secs()))
        .unwrap_or_else(|_| HeaderValue::from_static("no-cache"))
}

fn json_bytes(body: Bytes, cache_control: HeaderValue) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header::CACHE_CONTROL, cache_control),
        ],
        body,
    )
        .into_response()
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> Response {
    warn!(error = %e, "Failed to read multipart upload");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::bad_request(e.body_text())),
    )
        .into_response()
}

fn pipeline_error(e: PipelineError) -> Response {
    let (status, body) = match &e {
        PipelineError::MalformedInput(msg) => {
            (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(msg.clone()))
        }
        PipelineError::SearchExecution(err) => {
            (StatusCode::BAD_GATEWAY, ErrorResponse::bad_gateway(err.to_string()))
        }
        PipelineError::Cancelled => (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorResponse::unavailable(e.to_string()),
        ),
        PipelineError::Config(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::internal_error(msg.clone()),
        ),
    };

    error!(status = %status, error = %e, "Request failed");
    (status, Json(body)).into_response()
}
