//! In-flight batch accumulator.

use transaction_search_shared::TransactionDocument;

/// Records waiting to be written in the next bulk request.
///
/// Holds at most `capacity` records. `take` hands the records out and leaves
/// a fresh, empty accumulator behind.
#[derive(Debug)]
pub(crate) struct Batch {
    records: Vec<TransactionDocument>,
    capacity: usize,
}

impl Batch {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, record: TransactionDocument) {
        debug_assert!(!self.is_full(), "batch overflow");
        self.records.push(record);
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    pub(crate) fn take(&mut self) -> Vec<TransactionDocument> {
        std::mem::replace(&mut self.records, Vec::with_capacity(self.capacity))
    }
}
