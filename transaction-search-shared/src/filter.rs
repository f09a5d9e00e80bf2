//! Engine-agnostic search filters.

use crate::classification::{classify, QueryField};

/// A filter to execute against the transaction index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    /// Exact match of `value` against an unanalyzed field.
    Term { field: String, value: String },
    /// Phrase match of `query` against an analyzed text field.
    MatchPhrase { field: String, query: String },
}

impl SearchFilter {
    /// Build the filter for a raw query string.
    ///
    /// Structured queries become a term filter on the matching keyword
    /// field; anything else becomes a phrase match on the message text.
    /// The query value is passed through untouched.
    pub fn for_query(query: &str) -> Self {
        Self::for_field(classify(query), query)
    }

    /// Build the filter for a query already classified as `field`.
    pub fn for_field(field: QueryField, query: &str) -> Self {
        match field.keyword_field() {
            Some(keyword) => SearchFilter::Term {
                field: keyword.to_string(),
                value: query.to_string(),
            },
            None => SearchFilter::MatchPhrase {
                field: QueryField::Message.document_field().to_string(),
                query: query.to_string(),
            },
        }
    }

    /// The index field this filter targets.
    pub fn field(&self) -> &str {
        match self {
            SearchFilter::Term { field, .. } | SearchFilter::MatchPhrase { field, .. } => field,
        }
    }
}
