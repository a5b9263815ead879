//! In-memory [`TableStore`] used for local runs and tests.
//!
//! Mirrors the semantics the service relies on from the real table: items
//! ordered by sort key within a partition, secondary-index queries resolved
//! against projected key attributes, and native TTL eviction of expired
//! records.

use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::Value;

use super::{
    ATTR_GSI_USER_ORDERS_PARTKEY, ATTR_GSI_USER_ORDERS_SORTKEY, ATTR_PARTKEY, ATTR_SORTKEY,
    ATTR_TTL, GSI_USER_ORDERS, QueryPage, QueryRequest, Record, RecordKey, StoreError, TableStore,
};

#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<BTreeMap<(String, String), Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_expired(record: &Record) -> bool {
        record
            .get(ATTR_TTL)
            .and_then(Value::as_i64)
            .is_some_and(|ttl| ttl <= chrono::Utc::now().timestamp())
    }

    fn attr_string(record: &Record, name: &str) -> Option<String> {
        record.get(name).and_then(Value::as_str).map(str::to_owned)
    }

    fn primary_key(record: &Record) -> Result<(String, String), StoreError> {
        let partkey = Self::attr_string(record, ATTR_PARTKEY)
            .ok_or_else(|| StoreError::Other(anyhow!("record is missing {ATTR_PARTKEY}")))?;
        let sortkey = Self::attr_string(record, ATTR_SORTKEY)
            .ok_or_else(|| StoreError::Other(anyhow!("record is missing {ATTR_SORTKEY}")))?;
        Ok((partkey, sortkey))
    }

    /// Key-condition attributes for a query: the table's own key pair, or the
    /// projected pair of the named secondary index.
    fn key_attrs(index_name: Option<&str>) -> Result<(&'static str, &'static str), StoreError> {
        match index_name {
            None => Ok((ATTR_PARTKEY, ATTR_SORTKEY)),
            Some(GSI_USER_ORDERS) => {
                Ok((ATTR_GSI_USER_ORDERS_PARTKEY, ATTR_GSI_USER_ORDERS_SORTKEY))
            }
            Some(other) => Err(StoreError::Other(anyhow!("unknown index {other}"))),
        }
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn get_item(&self, key: &RecordKey) -> Result<Option<Record>, StoreError> {
        let items = self
            .items
            .read()
            .map_err(|_| StoreError::Other(anyhow!("store lock poisoned")))?;
        Ok(items
            .get(&(key.partkey.clone(), key.sortkey.clone()))
            .filter(|record| !Self::is_expired(record))
            .cloned())
    }

    async fn put_item(&self, record: Record) -> Result<(), StoreError> {
        let key = Self::primary_key(&record)?;
        let mut items = self
            .items
            .write()
            .map_err(|_| StoreError::Other(anyhow!("store lock poisoned")))?;
        items.insert(key, record);
        Ok(())
    }

    async fn update_item(
        &self,
        key: &RecordKey,
        set: Record,
        remove: Vec<String>,
    ) -> Result<(), StoreError> {
        let mut items = self
            .items
            .write()
            .map_err(|_| StoreError::Other(anyhow!("store lock poisoned")))?;
        let record = items
            .entry((key.partkey.clone(), key.sortkey.clone()))
            .or_insert_with(|| {
                let mut fresh = Record::new();
                fresh.insert(ATTR_PARTKEY.to_owned(), Value::String(key.partkey.clone()));
                fresh.insert(ATTR_SORTKEY.to_owned(), Value::String(key.sortkey.clone()));
                fresh
            });
        for (name, value) in set {
            record.insert(name, value);
        }
        for name in remove {
            record.remove(&name);
        }
        Ok(())
    }

    async fn delete_item(&self, key: &RecordKey) -> Result<(), StoreError> {
        let mut items = self
            .items
            .write()
            .map_err(|_| StoreError::Other(anyhow!("store lock poisoned")))?;
        items.remove(&(key.partkey.clone(), key.sortkey.clone()));
        Ok(())
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryPage, StoreError> {
        let (pk_attr, sk_attr) = Self::key_attrs(request.index_name)?;
        let items = self
            .items
            .read()
            .map_err(|_| StoreError::Other(anyhow!("store lock poisoned")))?;

        // Collect the partition ordered by the relevant sort attribute. The
        // primary key range is already ordered; index matches are re-sorted by
        // the projected sort attribute.
        let mut matches: Vec<(String, Record)> = items
            .values()
            .filter(|record| !Self::is_expired(record))
            .filter(|record| {
                Self::attr_string(record, pk_attr).as_deref() == Some(&request.partition_value)
            })
            .filter_map(|record| Some((Self::attr_string(record, sk_attr)?, record.clone())))
            .collect();
        matches.sort_by(|a, b| a.0.cmp(&b.0));

        if let Some(prefix) = &request.sort_key_prefix {
            matches.retain(|(sort_value, _)| sort_value.starts_with(prefix.as_str()));
        }

        // Resume strictly after the continuation key's position.
        if let Some(start_key) = &request.start_key {
            if let Some(position) = matches.iter().position(|(_, record)| {
                Self::attr_string(record, ATTR_PARTKEY).as_deref() == Some(&start_key.partkey)
                    && Self::attr_string(record, ATTR_SORTKEY).as_deref() == Some(&start_key.sortkey)
            }) {
                matches.drain(..=position);
            }
        }

        if let Some(filter) = &request.filter {
            matches.retain(|(_, record)| filter.matches(record));
        }

        let limit = request.limit.unwrap_or(usize::MAX);
        let has_more = matches.len() > limit;
        matches.truncate(limit);

        let last_key = if has_more {
            matches.last().and_then(|(_, record)| {
                Some(RecordKey::new(
                    Self::attr_string(record, ATTR_PARTKEY)?,
                    Self::attr_string(record, ATTR_SORTKEY)?,
                ))
            })
        } else {
            None
        };

        Ok(QueryPage {
            items: matches.into_iter().map(|(_, record)| record).collect(),
            last_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(partkey: &str, sortkey: &str, extra: &[(&str, Value)]) -> Record {
        let mut record = Record::new();
        record.insert(ATTR_PARTKEY.to_owned(), json!(partkey));
        record.insert(ATTR_SORTKEY.to_owned(), json!(sortkey));
        for (name, value) in extra {
            record.insert((*name).to_owned(), value.clone());
        }
        record
    }

    #[tokio::test]
    async fn query_is_scoped_to_the_partition() {
        let store = MemoryStore::new();
        store.put_item(record("orders_c1", "r1_a", &[])).await.unwrap();
        store.put_item(record("orders_c2", "r1_a", &[])).await.unwrap();

        let page = store
            .query(QueryRequest::partition("orders_c1"))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn sort_key_prefix_narrows_the_partition() {
        let store = MemoryStore::new();
        store.put_item(record("orders_c1", "r1_a", &[])).await.unwrap();
        store.put_item(record("orders_c1", "r1_b", &[])).await.unwrap();
        store.put_item(record("orders_c1", "r2_a", &[])).await.unwrap();

        let page = store
            .query(QueryRequest::partition("orders_c1").with_sort_key_prefix("r1_"))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn pagination_resumes_after_the_continuation_key() {
        let store = MemoryStore::new();
        for sortkey in ["a", "b", "c"] {
            store.put_item(record("p", sortkey, &[])).await.unwrap();
        }

        let first = store
            .query(QueryRequest::partition("p").with_limit(2))
            .await
            .unwrap();
        assert_eq!(first.items.len(), 2);
        let last_key = first.last_key.expect("more pages expected");

        let second = store
            .query(
                QueryRequest::partition("p")
                    .with_limit(2)
                    .with_start_key(Some(last_key)),
            )
            .await
            .unwrap();
        assert_eq!(second.items.len(), 1);
        assert!(second.last_key.is_none());
    }

    #[tokio::test]
    async fn expired_records_are_invisible() {
        let store = MemoryStore::new();
        let expired = chrono::Utc::now().timestamp() - 60;
        store
            .put_item(record("pre_order_c1_u1", "abc", &[(ATTR_TTL, json!(expired))]))
            .await
            .unwrap();

        let key = RecordKey::new("pre_order_c1_u1", "abc");
        assert!(store.get_item(&key).await.unwrap().is_none());
        let page = store
            .query(QueryRequest::partition("pre_order_c1_u1"))
            .await
            .unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn update_sets_and_removes_attributes() {
        let store = MemoryStore::new();
        store
            .put_item(record("p", "s", &[("title", json!("old")), ("notes", json!("x"))]))
            .await
            .unwrap();

        let key = RecordKey::new("p", "s");
        let mut set = Record::new();
        set.insert("title".to_owned(), json!("new"));
        store
            .update_item(&key, set, vec!["notes".to_owned()])
            .await
            .unwrap();

        let updated = store.get_item(&key).await.unwrap().unwrap();
        assert_eq!(updated.get("title"), Some(&json!("new")));
        assert!(!updated.contains_key("notes"));
    }
}
