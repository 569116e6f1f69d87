//! In-memory store — used by tests and ephemeral demo runs.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use steward_core::error::StoreError;
use steward_core::store::{DataStore, StoreQuery};
use tokio::sync::RwLock;

use crate::ensure_id;

/// Collections of JSON documents kept in insertion order.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<Value>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `(collection, document)` pairs.
    pub async fn with_documents(
        documents: impl IntoIterator<Item = (&'static str, Value)>,
    ) -> Result<Self, StoreError> {
        let store = Self::new();
        for (collection, doc) in documents {
            store.insert(collection, doc).await?;
        }
        Ok(store)
    }
}

#[async_trait]
impl DataStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn find(&self, query: &StoreQuery) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };
        Ok(query.apply(docs.iter().cloned()))
    }

    async fn insert(&self, collection: &str, mut document: Value) -> Result<String, StoreError> {
        let id = ensure_id(&mut document)?;
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(id)
    }

    async fn count(&self, collection: &str) -> Result<usize, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn insert_assigns_id() {
        let store = InMemoryStore::new();
        let id = store.insert("notes", json!({"text": "hi"})).await.unwrap();
        assert!(!id.is_empty());

        let rows = store.find(&StoreQuery::new("notes")).await.unwrap();
        assert_eq!(rows[0]["id"], id);
    }

    #[tokio::test]
    async fn insert_keeps_existing_id() {
        let store = InMemoryStore::new();
        let id = store
            .insert("notes", json!({"id": "n-1", "text": "hi"}))
            .await
            .unwrap();
        assert_eq!(id, "n-1");
    }

    #[tokio::test]
    async fn non_object_rejected() {
        let store = InMemoryStore::new();
        let err = store.insert("notes", json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument(_)));
    }

    #[tokio::test]
    async fn unknown_collection_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.find(&StoreQuery::new("nope")).await.unwrap().is_empty());
        assert_eq!(store.count("nope").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn find_filters_and_sorts() {
        let store = InMemoryStore::with_documents([
            ("invoices", json!({"businessId": "b1", "amount": 10, "dueDate": "2026-01-02"})),
            ("invoices", json!({"businessId": "b2", "amount": 20, "dueDate": "2026-01-01"})),
            ("invoices", json!({"businessId": "b1", "amount": 30, "dueDate": "2026-01-03"})),
        ])
        .await
        .unwrap();

        let q = StoreQuery::new("invoices")
            .eq("businessId", "b1")
            .sort_desc("dueDate");
        let rows = store.find(&q).await.unwrap();
        let amounts: Vec<_> = rows.iter().map(|r| r["amount"].as_i64().unwrap()).collect();
        assert_eq!(amounts, vec![30, 10]);
        assert_eq!(store.count("invoices").await.unwrap(), 3);
    }
}
