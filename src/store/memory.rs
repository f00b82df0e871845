//! In-memory configuration store.
//!
//! Backs rehearsals and tests.

use crate::core::{Error, Result};
use crate::store::{ConfigStore, PARTITION_KEY};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Tables of JSON documents held in memory.
#[derive(Default)]
pub struct MemoryConfigStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document to `table`.
    ///
    /// The document must carry a string partition key.
    pub fn put(&self, table: &str, item: Value) -> Result<()> {
        if partition_key(&item).is_none() {
            return Err(Error::MissingField(PARTITION_KEY.to_string()));
        }
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables.entry(table.to_string()).or_default().push(item);
        Ok(())
    }

    fn matching(&self, table: &str, key: &str) -> Vec<Value> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables
            .get(table)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| partition_key(item) == Some(key))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn partition_key(item: &Value) -> Option<&str> {
    item.get(PARTITION_KEY).and_then(Value::as_str)
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self, table: &str, key: &str) -> Result<Option<Value>> {
        Ok(self.matching(table, key).into_iter().next())
    }

    async fn query(&self, table: &str, key: &str) -> Result<Vec<Value>> {
        Ok(self.matching(table, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_requires_partition_key() {
        let store = MemoryConfigStore::new();
        let err = store.put("t", json!({"name": "x"})).unwrap_err();
        assert!(matches!(err, Error::MissingField(_)));
    }

    #[tokio::test]
    async fn test_query_filters_by_key() {
        let store = MemoryConfigStore::new();
        store.put("t", json!({"arcClusterName": "a", "n": 1})).unwrap();
        store.put("t", json!({"arcClusterName": "b", "n": 2})).unwrap();
        store.put("t", json!({"arcClusterName": "a", "n": 3})).unwrap();

        let items = store.query("t", "a").await.unwrap();
        assert_eq!(items.len(), 2);

        let first = store.get("t", "a").await.unwrap().unwrap();
        assert_eq!(first["n"], 1);
        assert!(store.get("missing", "a").await.unwrap().is_none());
    }
}
