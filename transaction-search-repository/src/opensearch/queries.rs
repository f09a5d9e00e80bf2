//! OpenSearch request builders and response parsers.
//!
//! This module turns `SearchFilter`s and documents into OpenSearch request
//! bodies, and pulls documents, scroll ids and bulk diagnostics back out of
//! the JSON responses.

use std::time::Duration;

use opensearch::http::request::JsonBody;
use serde_json::{json, Value};

use crate::errors::SearchError;
use transaction_search_shared::{SearchFilter, TransactionDocument};

/// Maximum number of failed item reasons included in a bulk diagnostic.
const MAX_DIAGNOSTIC_ITEMS: usize = 3;

/// Build the query clause for a filter.
///
/// - `Term` becomes a `term` query on the (keyword) field
/// - `MatchPhrase` becomes a `match_phrase` query on the (analyzed) field
pub fn build_filter_query(filter: &SearchFilter) -> Value {
    match filter {
        SearchFilter::Term { field, value } => json!({
            "term": {
                field.as_str(): {
                    "value": value
                }
            }
        }),
        SearchFilter::MatchPhrase { field, query } => json!({
            "match_phrase": {
                field.as_str(): {
                    "query": query
                }
            }
        }),
    }
}

/// Build the body of the initial scroll search request.
pub fn build_search_body(filter: &SearchFilter, page_size: usize) -> Value {
    json!({
        "size": page_size,
        "query": build_filter_query(filter)
    })
}

/// Build the body of a scroll continuation request.
pub fn build_scroll_body(scroll_id: &str, scroll_timeout: Duration) -> Value {
    json!({
        "scroll": format_scroll_timeout(scroll_timeout),
        "scroll_id": scroll_id
    })
}

/// Build the body of a clear-scroll request.
pub fn build_clear_scroll_body(scroll_id: &str) -> Value {
    json!({
        "scroll_id": [scroll_id]
    })
}

/// Build the NDJSON body of a bulk index request.
///
/// Each document is preceded by an `index` action without an explicit id;
/// the engine assigns one.
pub fn build_bulk_body(
    documents: &[TransactionDocument],
) -> Result<Vec<JsonBody<Value>>, SearchError> {
    let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);

    for doc in documents {
        let source =
            serde_json::to_value(doc).map_err(|e| SearchError::serialization(e.to_string()))?;
        body.push(json!({ "index": {} }).into());
        body.push(source.into());
    }

    Ok(body)
}

/// Format a scroll keep-alive as an OpenSearch time unit.
pub fn format_scroll_timeout(timeout: Duration) -> String {
    let secs = timeout.as_secs();
    if secs > 0 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", timeout.as_millis().max(1))
    }
}

/// Extract the scroll id from a search or scroll response.
pub fn parse_scroll_id(body: &Value) -> Result<String, SearchError> {
    body.get("_scroll_id")
        .and_then(|id| id.as_str())
        .map(str::to_string)
        .ok_or_else(|| SearchError::parse("Response is missing _scroll_id"))
}

/// Extract the documents from the `hits.hits[]._source` of a response.
pub fn parse_hits(body: &Value) -> Result<Vec<TransactionDocument>, SearchError> {
    let hits = body
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(|h| h.as_array())
        .ok_or_else(|| SearchError::parse("Response is missing hits.hits"))?;

    hits.iter()
        .map(|hit| {
            let source = hit
                .get("_source")
                .ok_or_else(|| SearchError::parse("Hit is missing _source"))?;
            serde_json::from_value::<TransactionDocument>(source.clone())
                .map_err(|e| SearchError::parse(e.to_string()))
        })
        .collect()
}

/// Summarise the failed items of a bulk response.
///
/// Returns the number of failed items and a diagnostic listing the first few
/// failure reasons.
pub fn summarize_bulk_errors(body: &Value) -> (usize, String) {
    let empty = Vec::new();
    let items = body
        .get("items")
        .and_then(|i| i.as_array())
        .unwrap_or(&empty);

    let failures: Vec<&Value> = items
        .iter()
        .filter_map(|item| item.get("index").and_then(|i| i.get("error")))
        .collect();

    let reasons: Vec<String> = failures
        .iter()
        .take(MAX_DIAGNOSTIC_ITEMS)
        .map(|error| {
            let kind = error.get("type").and_then(|t| t.as_str()).unwrap_or("unknown");
            let reason = error.get("reason").and_then(|r| r.as_str()).unwrap_or("");
            format!("[{}] {}", kind, reason)
        })
        .collect();

    let diagnostic = format!(
        "{} of {} items failed: {}",
        failures.len(),
        items.len(),
        reasons.join("; ")
    );

    (failures.len(), diagnostic)
}
