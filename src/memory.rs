//! In-memory [`DocumentStore`] for tests and local runs.
use std::{
    collections::{BTreeMap, HashMap},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::store::{DocumentStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
    writes: AtomicUsize,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` and `delete` calls that reached the store.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Every call fails with [`StoreError::Unavailable`] while offline.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        self.check_online()?;

        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(key))
            .cloned())
    }

    async fn set(&self, collection: &str, key: &str, value: Value) -> Result<(), StoreError> {
        self.check_online()?;
        self.writes.fetch_add(1, Ordering::SeqCst);

        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), value);

        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        self.check_online()?;
        self.writes.fetch_add(1, Ordering::SeqCst);

        if let Some(documents) = self.collections.write().await.get_mut(collection) {
            documents.remove(key);
        }

        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        self.check_online()?;

        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_set_replaces_whole_document() {
        let store = MemoryStore::new();
        store
            .set("inventory", "rice", json!({ "quantity": 2, "note": "bag" }))
            .await
            .unwrap();
        store
            .set("inventory", "rice", json!({ "quantity": 3 }))
            .await
            .unwrap();

        assert_eq!(
            store.get("inventory", "rice").await.unwrap(),
            Some(json!({ "quantity": 3 }))
        );
        assert_eq!(store.writes(), 2);
    }

    #[tokio::test]
    async fn test_collections_are_separate() {
        let store = MemoryStore::new();
        store.set("users", "a@b.c", json!({})).await.unwrap();

        assert!(store.get("inventory", "a@b.c").await.unwrap().is_none());
        assert!(store.list("inventory").await.unwrap().is_empty());
        assert_eq!(store.list("users").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_key() {
        let store = MemoryStore::new();
        store.delete("inventory", "nothing").await.unwrap();

        assert!(store.list("inventory").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offline() {
        let store = MemoryStore::new();
        store.set_offline(true);

        assert!(matches!(
            store.get("inventory", "rice").await,
            Err(StoreError::Unavailable(_))
        ));

        store.set_offline(false);
        assert!(store.get("inventory", "rice").await.unwrap().is_none());
    }
}
