//! Gateway between domain entities and the raw [`TableStore`].
//!
//! Adds what every caller needs and must not reimplement: bounded retry with
//! jittered backoff on throttling, `NotFound` on absent records, the
//! dual-whitelist update semantics, and cursor-following queries.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde_json::Value;

use crate::core::app_error::AppError;
use crate::store::{QueryPage, QueryRequest, Record, RecordKey, StoreError, TableStore};

/// Retry ceiling for throttled single-item operations. Exceeding it is fatal
/// to the calling request.
const MAX_RETRIES: u32 = 15;

const BACKOFF_CAP_SECONDS: f64 = 10.0;

/// Retry a store operation on throttling, with jittered exponential backoff.
async fn with_retry<T, F, Fut>(operation: &'static str, mut call: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let timeout_seed = rand::thread_rng().gen_range(0.1_f64..0.99);
    for attempt in 0..MAX_RETRIES {
        match call().await {
            Ok(value) => return Ok(value),
            Err(StoreError::Throttled) => {
                let backoff =
                    (timeout_seed * f64::from(1_u32 << attempt.min(6))).min(BACKOFF_CAP_SECONDS);
                tracing::warn!(operation, attempt, backoff, "store throttled, backing off");
                tokio::time::sleep(Duration::from_secs_f64(backoff)).await;
            }
            Err(StoreError::Other(error)) => {
                return Err(AppError::Other(error.context(operation)));
            }
        }
    }
    tracing::error!(operation, "max number of {MAX_RETRIES} store retries has exceeded");
    Err(AppError::RetriesExceeded)
}

#[derive(Clone)]
pub struct Gateway {
    store: Arc<dyn TableStore>,
}

impl Gateway {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Fetch one record, failing with `NotFound` when absent.
    pub async fn get(&self, key: &RecordKey) -> Result<Record, AppError> {
        let item = with_retry("get_item", || self.store.get_item(key)).await?;
        item.ok_or_else(|| {
            tracing::warn!(
                partkey = %key.partkey,
                sortkey = %key.sortkey,
                "record not found"
            );
            AppError::NotFound
        })
    }

    /// Unconditional upsert. Callers own not clobbering concurrent writes.
    pub async fn put(&self, record: Record) -> Result<(), AppError> {
        with_retry("put_item", || self.store.put_item(record.clone())).await
    }

    /// Apply a whitelisted partial update.
    ///
    /// Fields of `patch` missing from `allowed_to_update` are skipped with a
    /// warning. A whitelisted field carrying an empty value (empty
    /// string/list/map) is removed from the record instead of set, but only
    /// when it is also listed in `allowed_to_delete`.
    pub async fn update(
        &self,
        key: &RecordKey,
        patch: Record,
        allowed_to_update: &[&str],
        allowed_to_delete: &[&str],
    ) -> Result<(), AppError> {
        let (set, remove) = build_update_expression(patch, allowed_to_update, allowed_to_delete);
        if set.is_empty() && remove.is_empty() {
            return Ok(());
        }
        with_retry("update_item", || {
            self.store.update_item(key, set.clone(), remove.clone())
        })
        .await
    }

    pub async fn delete(&self, key: &RecordKey) -> Result<(), AppError> {
        with_retry("delete_item", || self.store.delete_item(key)).await
    }

    /// One page of a partition query; the caller manages the cursor.
    pub async fn query_page(&self, request: QueryRequest) -> Result<QueryPage, AppError> {
        self.store
            .query(request)
            .await
            .map_err(|error| match error {
                StoreError::Throttled => AppError::RetriesExceeded,
                StoreError::Other(error) => AppError::Other(error.context("query")),
            })
    }

    /// Follow the continuation key until the partition is exhausted. For
    /// listing endpoints where the result set is known to stay small.
    pub async fn query_all(&self, request: QueryRequest) -> Result<Vec<Record>, AppError> {
        let mut all_items = Vec::new();
        let mut page = self.query_page(request.clone()).await?;
        all_items.append(&mut page.items);
        while let Some(last_key) = page.last_key {
            page = self
                .query_page(request.clone().with_start_key(Some(last_key)))
                .await?;
            all_items.append(&mut page.items);
        }
        Ok(all_items)
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Split a patch into SET and REMOVE halves under the two whitelists.
pub fn build_update_expression(
    patch: Record,
    allowed_to_update: &[&str],
    allowed_to_delete: &[&str],
) -> (Record, Vec<String>) {
    let mut set = Record::new();
    let mut remove = Vec::new();
    for (field, value) in patch {
        if !allowed_to_update.iter().any(|allowed| *allowed == field) {
            tracing::warn!(%field, "field is not allowed to update, skipping");
            continue;
        }
        if value.is_null() {
            continue;
        }
        if is_empty_value(&value) && allowed_to_delete.iter().any(|allowed| *allowed == field) {
            remove.push(field);
        } else {
            set.insert(field, value);
        }
    }
    (set, remove)
}
