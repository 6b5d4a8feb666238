//! # Document Store
//!
//! Collections of key to JSON document.
//!
//! ## Contract
//!
//! - `get`: point lookup, `None` when absent
//! - `set`: full replace, never a merge
//! - `delete`: removing an absent key is not an error
//! - `list`: full collection scan, order unspecified
//!
//! Nothing here is transactional. A read followed by a write on the same key can
//! interleave with another client's read and write.
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

pub const INVENTORY: &str = "inventory";
pub const USERS: &str = "users";
pub const ACCOUNTS: &str = "accounts";
pub const SESSIONS: &str = "sessions";

pub type SharedStore = Arc<dyn DocumentStore>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed document at {collection}/{key}")]
    Corrupt { collection: String, key: String },
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, collection: &str, key: &str, value: Value) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError>;

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError>;
}

/// Typed read of a single document.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    key: &str,
) -> Result<Option<T>, StoreError> {
    store
        .get(collection, key)
        .await?
        .map(|value| decode(collection, key, value))
        .transpose()
}

pub async fn set_typed<T: Serialize>(
    store: &dyn DocumentStore,
    collection: &str,
    key: &str,
    record: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(record).map_err(|_| StoreError::Corrupt {
        collection: collection.to_string(),
        key: key.to_string(),
    })?;

    store.set(collection, key, value).await
}

pub fn decode<T: DeserializeOwned>(
    collection: &str,
    key: &str,
    value: Value,
) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|_| StoreError::Corrupt {
        collection: collection.to_string(),
        key: key.to_string(),
    })
}
