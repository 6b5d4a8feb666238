//! # Redis
//!
//! RAM database backing every collection.
//!
//! ## Implementation
//!
//! - Redis hash per collection: 1 big key, then key-value pairs
//! - Field is the document key, value is the document as JSON text
//! - `HSET` replaces the whole document, matching the store contract
//! - `HGETALL` for listing, fine while the pantry stays small
//!
//! Reads and writes are separate round trips, nothing is wrapped in `MULTI`.
use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use pantry::store::{DocumentStore, StoreError};
use redis::{
    AsyncCommands, Client, RedisError,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use serde_json::Value;
use tracing::info;

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, RedisError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    info!("Connected to Redis at {redis_url}");
    Ok(connection_manager)
}

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

fn unavailable(e: RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn parse(collection: &str, key: &str, raw: &str) -> Result<Value, StoreError> {
    serde_json::from_str(raw).map_err(|_| StoreError::Corrupt {
        collection: collection.to_string(),
        key: key.to_string(),
    })
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let mut connection = self.connection.clone();
        let raw: Option<String> = connection
            .hget(collection, key)
            .await
            .map_err(unavailable)?;

        raw.map(|raw| parse(collection, key, &raw)).transpose()
    }

    async fn set(&self, collection: &str, key: &str, value: Value) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let _: () = connection
            .hset(collection, key, value.to_string())
            .await
            .map_err(unavailable)?;

        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let _: () = connection
            .hdel(collection, key)
            .await
            .map_err(unavailable)?;

        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let mut connection = self.connection.clone();
        let raw: HashMap<String, String> =
            connection.hgetall(collection).await.map_err(unavailable)?;

        raw.into_iter()
            .map(|(key, raw)| -> Result<(String, Value), StoreError> {
                let value = parse(collection, &key, &raw)?;
                Ok((key, value))
            })
            .collect()
    }
}
