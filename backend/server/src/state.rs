use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use pantry::{
    Accounts, InventoryEngine, SharedStore, StoreIdentityProvider, identity::IdentityProvider,
};

use super::{
    config::Config,
    database::{RedisStore, init_redis},
};

pub struct State {
    pub config: Config,
    pub inventory: InventoryEngine,
    pub accounts: Accounts,
}

impl State {
    pub async fn new() -> Result<Arc<Self>> {
        let config = Config::load()?;

        let redis_connection = init_redis(&config.redis_url).await?;
        let store: SharedStore = Arc::new(RedisStore::new(redis_connection));

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: SharedStore) -> Arc<Self> {
        let identity: Arc<dyn IdentityProvider> = Arc::new(StoreIdentityProvider::new(
            store.clone(),
            config.password_pepper.clone(),
            Duration::seconds(config.recent_login_secs),
        ));

        Arc::new(Self {
            inventory: InventoryEngine::new(store.clone()),
            accounts: Accounts::new(identity, store),
            config,
        })
    }
}
