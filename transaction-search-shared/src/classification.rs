//! Query classification.
//!
//! A raw query string is matched against an ordered list of shape rules to
//! decide which structured field it targets. The list is evaluated
//! first-match, so the order below is part of the contract: the patterns are
//! not disjoint (`1000.000` is both an amount and a transaction id).

use once_cell::sync::Lazy;
use regex::Regex;

/// The document field a query is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryField {
    /// Grouped-thousands amount ending in `.000`.
    Amount,
    /// `DD/MM/YYYY` date.
    Date,
    /// `DDDD(D).DD…` transaction identifier.
    TransactionId,
    /// Anything else; matched as a phrase against the message text.
    Message,
}

impl QueryField {
    /// Name of the field in the stored document.
    pub fn document_field(&self) -> &'static str {
        match self {
            QueryField::Amount => "amount",
            QueryField::Date => "date",
            QueryField::TransactionId => "trans_id",
            QueryField::Message => "message",
        }
    }

    /// Name of the unanalyzed sub-field used for exact term matches.
    ///
    /// Returns `None` for the free-text field, which is only ever matched in
    /// its analyzed form.
    pub fn keyword_field(&self) -> Option<&'static str> {
        match self {
            QueryField::Amount => Some("amount.keyword"),
            QueryField::Date => Some("date.keyword"),
            QueryField::TransactionId => Some("trans_id.keyword"),
            QueryField::Message => None,
        }
    }

    /// Whether this field is matched by exact term rather than phrase.
    pub fn is_structured(&self) -> bool {
        self.keyword_field().is_some()
    }
}

static AMOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{1,3}\.*\d{3}\.*\d{3}\.*\d{3}\.000|\d{1,3}\.*\d{3}\.*\d{3}\.000|\d{1,3}\.*\d{3}\.000|\d{1,3}\.000)$",
    )
    .expect("amount pattern is valid")
});

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("date pattern is valid"));

static TRANSACTION_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4,5}\.\d{2,9}$").expect("transaction id pattern is valid")
});

/// Structured rules in evaluation order. `Message` is the fallback and has
/// no rule of its own.
static RULES: Lazy<[(&'static Regex, QueryField); 3]> = Lazy::new(|| {
    [
        (&*AMOUNT_PATTERN, QueryField::Amount),
        (&*DATE_PATTERN, QueryField::Date),
        (&*TRANSACTION_ID_PATTERN, QueryField::TransactionId),
    ]
});

/// Classify a raw query string.
///
/// The string is matched as-is; callers are expected to have rejected blank
/// queries before calling this.
pub fn classify(query: &str) -> QueryField {
    RULES
        .iter()
        .find(|(pattern, _)| pattern.is_match(query))
        .map(|(_, field)| *field)
        .unwrap_or(QueryField::Message)
}
