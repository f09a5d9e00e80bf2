//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the transaction index.

use serde_json::{json, Value};

/// The default name of the transaction index.
pub const DEFAULT_INDEX_NAME: &str = "transactions";

/// Index the client reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Index name.
    pub name: String,
    /// Primary shard count used when the index is created.
    pub number_of_shards: u32,
    /// Replica count used when the index is created.
    pub number_of_replicas: u32,
}

impl IndexConfig {
    /// Create a config for the named index with a single shard and replica.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number_of_shards: 1,
            number_of_replicas: 1,
        }
    }

    /// Get the index settings and mappings for the transaction index.
    ///
    /// Every property is analyzed `text` for phrase matching and carries a
    /// `keyword` sub-field for exact term lookups. Structured queries only
    /// ever hit the `keyword` form, so values are compared byte for byte.
    pub fn index_settings(&self) -> Value {
        json!({
            "settings": {
                "number_of_shards": self.number_of_shards,
                "number_of_replicas": self.number_of_replicas
            },
            "mappings": {
                "properties": {
                    "date": text_with_keyword(),
                    "trans_id": text_with_keyword(),
                    "amount": text_with_keyword(),
                    "message": text_with_keyword()
                }
            }
        })
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_NAME)
    }
}

fn text_with_keyword() -> Value {
    json!({
        "type": "text",
        "fields": {
            "keyword": {
                "type": "keyword",
                "ignore_above": 256
            }
        }
    })
}
