//! Transaction document type.
//!
//! This is the record format exchanged with uploaders and stored in the
//! search index. All four fields are kept as strings; no numeric or date
//! coercion happens anywhere in the service.

use serde::{Deserialize, Serialize};

/// A single transaction as uploaded and as stored in the search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDocument {
    /// Transaction date, e.g. `31/12/2024`.
    pub date: String,
    /// Transaction identifier, e.g. `12345.6789`.
    #[serde(rename = "trans_id")]
    pub transaction_id: String,
    /// Transaction amount with `.` grouping, e.g. `1.234.567.000`.
    pub amount: String,
    /// Free-text transfer message.
    pub message: String,
}

impl TransactionDocument {
    /// Create a new transaction document.
    pub fn new(
        date: impl Into<String>,
        transaction_id: impl Into<String>,
        amount: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            transaction_id: transaction_id.into(),
            amount: amount.into(),
            message: message.into(),
        }
    }
}
