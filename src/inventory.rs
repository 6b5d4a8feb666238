//! # Inventory
//!
//! Item name to quantity, kept in the `inventory` collection.
//!
//! ## Rules
//!
//! - A record exists only while its quantity is at least 1
//! - Removing the last unit deletes the record, quantity 0 is never written
//! - Every write replaces the whole document
//! - Add/remove use the name verbatim as the key
//! - Search trims and lower-cases the query before the lookup, but displays the
//!   trimmed query as typed
//!
//! Add and remove therefore treat `Milk` and `milk` as two items while search
//! only ever finds `milk`.
//!
//! ## Known Limitation
//!
//! Every mutation is a read followed by a write with nothing holding the key in
//! between. Two clients changing the same item at once can both read the same
//! quantity, and the later write wins.
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    error::PantryError,
    session::Session,
    store::{INVENTORY, SharedStore, decode, get_typed, set_typed},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub name: String,
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Removal {
    Absent,
    Deleted,
    Decremented { quantity: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum SearchOutcome {
    Found(SearchResult),
    Created(SearchResult),
    Declined,
}

/// Lookup key for a search query, `None` when nothing is left after trimming.
pub fn normalize(query: &str) -> Option<String> {
    let trimmed = query.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

pub struct InventoryEngine {
    store: SharedStore,
}

impl InventoryEngine {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<InventoryItem>, PantryError> {
        let documents = self.store.list(INVENTORY).await?;
        debug!("Listed {} items", documents.len());

        documents
            .into_iter()
            .map(|(name, value)| -> Result<InventoryItem, PantryError> {
                let record: InventoryRecord = decode(INVENTORY, &name, value)?;
                Ok(InventoryItem {
                    name,
                    quantity: record.quantity,
                })
            })
            .collect()
    }

    /// Returns the quantity now stored under `name`.
    pub async fn add(&self, session: &Session, name: &str) -> Result<u32, PantryError> {
        require_session(session, "add")?;
        if name.trim().is_empty() {
            return Err(PantryError::EmptyInput("before adding"));
        }

        let quantity = match self.read(name).await? {
            Some(record) => record
                .quantity
                .checked_add(1)
                .ok_or_else(|| PantryError::QuantityLimit(name.to_string()))?,
            None => 1,
        };
        self.write(name, quantity).await?;

        info!("Added {name}, now {quantity}");
        Ok(quantity)
    }

    pub async fn remove(&self, session: &Session, name: &str) -> Result<Removal, PantryError> {
        require_session(session, "remove")?;
        if name.trim().is_empty() {
            return Err(PantryError::EmptyInput("before removing"));
        }

        let removal = match self.read(name).await? {
            None => {
                debug!("Remove of missing {name} ignored");
                return Ok(Removal::Absent);
            }
            Some(record) if record.quantity <= 1 => {
                self.store.delete(INVENTORY, name).await?;
                Removal::Deleted
            }
            Some(record) => {
                let quantity = record.quantity - 1;
                self.write(name, quantity).await?;
                Removal::Decremented { quantity }
            }
        };

        info!("Removed {name}: {removal:?}");
        Ok(removal)
    }

    /// Read half of [`Self::search`], no prompt and no write.
    pub async fn lookup(&self, query: &str) -> Result<Option<SearchResult>, PantryError> {
        let key = normalize(query).ok_or(PantryError::EmptyInput("to search"))?;

        Ok(self.read(&key).await?.map(|record| SearchResult {
            name: query.trim().to_string(),
            quantity: record.quantity,
        }))
    }

    /// Looks the query up, asking `confirm` whether to create it when missing.
    ///
    /// `confirm` gets the trimmed query and runs at most once.
    pub async fn search<F>(
        &self,
        session: &Session,
        query: &str,
        confirm: F,
    ) -> Result<SearchOutcome, PantryError>
    where
        F: FnOnce(&str) -> bool,
    {
        if let Some(found) = self.lookup(query).await? {
            return Ok(SearchOutcome::Found(found));
        }

        let shown = query.trim();
        if !confirm(shown) {
            debug!("Creation of {shown} declined");
            return Ok(SearchOutcome::Declined);
        }

        require_session(session, "add")?;

        let key = shown.to_lowercase();
        self.write(&key, 1).await?;
        info!("Created {key} from search");

        Ok(SearchOutcome::Created(SearchResult {
            name: shown.to_string(),
            quantity: 1,
        }))
    }

    async fn read(&self, name: &str) -> Result<Option<InventoryRecord>, PantryError> {
        Ok(get_typed(&*self.store, INVENTORY, name).await?)
    }

    async fn write(&self, name: &str, quantity: u32) -> Result<(), PantryError> {
        set_typed(&*self.store, INVENTORY, name, &InventoryRecord { quantity }).await?;

        Ok(())
    }
}

fn require_session(session: &Session, action: &'static str) -> Result<(), PantryError> {
    if session.is_authenticated() {
        return Ok(());
    }

    warn!("Refused to {action} items without a session");
    Err(PantryError::Unauthenticated { action })
}
