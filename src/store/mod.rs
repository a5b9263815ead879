//! Single-table key-value store abstraction.
//!
//! Every domain record lives in one logical table keyed by
//! `(partkey, sortkey)`. The storage engine behind [`TableStore`] is a black
//! box with get/put/update/query/delete and conditional-write-free semantics;
//! [`MemoryStore`](memory::MemoryStore) implements it for local runs and
//! tests. All application code goes through
//! [`Gateway`](gateway::Gateway), which adds retries, the update whitelist and
//! not-found handling.

pub mod gateway;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::app_error::AppError;

/// A raw table record: attribute name → JSON value.
pub type Record = serde_json::Map<String, Value>;

pub const ATTR_PARTKEY: &str = "partkey";
pub const ATTR_SORTKEY: &str = "sortkey";

/// Secondary index projecting orders by user instead of by restaurant.
pub const GSI_USER_ORDERS: &str = "gsi_user_orders";
pub const ATTR_GSI_USER_ORDERS_PARTKEY: &str = "gsi_user_orders_partkey";
pub const ATTR_GSI_USER_ORDERS_SORTKEY: &str = "gsi_user_orders_sortkey";

/// Records carrying `ttl_` expire once the epoch timestamp passes; eviction
/// is the store's job, not the application's.
pub const ATTR_TTL: &str = "ttl_";

/// Composite primary key of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordKey {
    pub partkey: String,
    pub sortkey: String,
}

impl RecordKey {
    pub fn new(partkey: impl Into<String>, sortkey: impl Into<String>) -> Self {
        Self {
            partkey: partkey.into(),
            sortkey: sortkey.into(),
        }
    }
}

/// Equality filter applied server-side after the key condition.
#[derive(Debug, Clone)]
pub enum FilterCondition {
    AttrEq(&'static str, Value),
}

impl FilterCondition {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::AttrEq(name, expected) => record.get(*name) == Some(expected),
        }
    }
}

/// A single-partition query. `index_name` switches the key condition to a
/// secondary-index key pair.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub partition_value: String,
    pub sort_key_prefix: Option<String>,
    pub filter: Option<FilterCondition>,
    pub index_name: Option<&'static str>,
    pub limit: Option<usize>,
    pub start_key: Option<RecordKey>,
}

impl QueryRequest {
    pub fn partition(partition_value: impl Into<String>) -> Self {
        Self {
            partition_value: partition_value.into(),
            sort_key_prefix: None,
            filter: None,
            index_name: None,
            limit: None,
            start_key: None,
        }
    }

    pub fn with_sort_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.sort_key_prefix = Some(prefix.into());
        self
    }

    pub fn with_filter(mut self, filter: FilterCondition) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn on_index(mut self, index_name: &'static str) -> Self {
        self.index_name = Some(index_name);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_start_key(mut self, start_key: Option<RecordKey>) -> Self {
        self.start_key = start_key;
        self
    }
}

/// One page of query results plus the continuation key, if more remain.
#[derive(Debug, Default)]
pub struct QueryPage {
    pub items: Vec<Record>,
    pub last_key: Option<RecordKey>,
}

/// Store-level failures. `Throttled` is the retryable class; everything else
/// is passed through.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("throughput exceeded")]
    Throttled,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait TableStore: Send + Sync {
    async fn get_item(&self, key: &RecordKey) -> Result<Option<Record>, StoreError>;
    async fn put_item(&self, record: Record) -> Result<(), StoreError>;
    async fn update_item(
        &self,
        key: &RecordKey,
        set: Record,
        remove: Vec<String>,
    ) -> Result<(), StoreError>;
    async fn delete_item(&self, key: &RecordKey) -> Result<(), StoreError>;
    async fn query(&self, request: QueryRequest) -> Result<QueryPage, StoreError>;
}

/// Encode a continuation key as an opaque cursor for clients.
pub fn encode_cursor(key: &RecordKey) -> Result<String, AppError> {
    let bytes = serde_json::to_vec(key).map_err(|e| AppError::Other(e.into()))?;
    Ok(hex::encode(bytes))
}

/// Decode a client-supplied cursor back into a continuation key.
pub fn decode_cursor(cursor: &str) -> Result<RecordKey, AppError> {
    let bytes =
        hex::decode(cursor).map_err(|_| AppError::BadRequest("invalid cursor".to_owned()))?;
    serde_json::from_slice(&bytes).map_err(|_| AppError::BadRequest("invalid cursor".to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_round_trips() {
        let key = RecordKey::new("orders_c1", "r1_abc");
        let cursor = encode_cursor(&key).unwrap();
        assert_eq!(decode_cursor(&cursor).unwrap(), key);
    }

    #[test]
    fn cursor_rejects_garbage() {
        assert!(matches!(
            decode_cursor("not-hex"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            decode_cursor("deadbeef"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn filter_matches_on_attribute_equality() {
        let mut record = Record::new();
        record.insert("archived".to_owned(), Value::Bool(false));
        let filter = FilterCondition::AttrEq("archived", Value::Bool(false));
        assert!(filter.matches(&record));
        let filter = FilterCondition::AttrEq("archived", Value::Bool(true));
        assert!(!filter.matches(&record));
    }
}
