//! # Identity Provider
//!
//! Email/password authentication issuing session tokens.
//!
//! ## Storage
//!
//! - `accounts`: email to `{ uid, email, salt, passwordHash }`
//! - `sessions`: token to `{ uid, email, signedInAt }`
//!
//! Password hashes are SHA-256 over salt, pepper and password, fed back into
//! itself for [`HASH_ROUNDS`] rounds and base64 encoded. The salt is 16 random
//! bytes per account. Stored and computed hashes are compared in constant time.
//!
//! Iterated SHA-256 slows offline guessing but is not memory-hard. Deployments
//! holding real credentials should put a managed identity service behind
//! [`IdentityProvider`] instead.
//!
//! ## Recent Login
//!
//! Deleting a user needs a session whose sign-in is younger than the configured
//! window. Older sessions get [`IdentityError::RequiresRecentLogin`] and must sign
//! in again first.
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::IdentityError,
    store::{ACCOUNTS, SESSIONS, SharedStore, decode, get_typed, set_typed},
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub const HASH_ROUNDS: u32 = 10_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub identity: Identity,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Credential, IdentityError>;

    async fn sign_out(&self, token: &str) -> Result<(), IdentityError>;

    async fn resolve(&self, token: &str) -> Result<Option<Identity>, IdentityError>;

    /// Removes the account behind `token` along with every one of its sessions.
    async fn delete_user(&self, token: &str) -> Result<Identity, IdentityError>;
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Account {
    uid: String,
    email: String,
    salt: String,
    password_hash: String,
}

pub struct StoreIdentityProvider {
    store: SharedStore,
    pepper: String,
    recent_login: Duration,
}

impl StoreIdentityProvider {
    pub fn new(store: SharedStore, pepper: impl Into<String>, recent_login: Duration) -> Self {
        Self {
            store,
            pepper: pepper.into(),
            recent_login,
        }
    }

    fn hash(&self, salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(self.pepper.as_bytes());
        hasher.update(password.as_bytes());
        let mut digest = hasher.finalize();

        for _ in 1..HASH_ROUNDS {
            let mut hasher = Sha256::new();
            hasher.update(digest);
            hasher.update(salt.as_bytes());
            digest = hasher.finalize();
        }

        STANDARD.encode(digest)
    }
}

/// Compares every byte regardless of where the first mismatch is.
fn same_hash(computed: &str, stored: &str) -> bool {
    let (computed, stored) = (computed.as_bytes(), stored.as_bytes());
    if computed.len() != stored.len() {
        return false;
    }

    computed
        .iter()
        .zip(stored)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

#[async_trait]
impl IdentityProvider for StoreIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::WeakPassword(MIN_PASSWORD_LEN));
        }

        if self.store.get(ACCOUNTS, email).await?.is_some() {
            warn!("Sign-up refused, {email} already registered");
            return Err(IdentityError::EmailInUse);
        }

        let mut salt_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = STANDARD.encode(salt_bytes);

        let account = Account {
            uid: Uuid::new_v4().simple().to_string(),
            email: email.to_string(),
            password_hash: self.hash(&salt, password),
            salt,
        };
        set_typed(&*self.store, ACCOUNTS, email, &account).await?;

        info!("Registered {email}");

        Ok(Identity {
            uid: account.uid,
            email: account.email,
            signed_in_at: Utc::now(),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Credential, IdentityError> {
        let account: Account = get_typed(&*self.store, ACCOUNTS, email)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        if !same_hash(&self.hash(&account.salt, password), &account.password_hash) {
            warn!("Bad password for {email}");
            return Err(IdentityError::InvalidCredentials);
        }

        let identity = Identity {
            uid: account.uid,
            email: account.email,
            signed_in_at: Utc::now(),
        };
        let token = Uuid::new_v4().simple().to_string();
        set_typed(&*self.store, SESSIONS, &token, &identity).await?;

        info!("Signed in {email}");

        Ok(Credential { token, identity })
    }

    async fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        self.store.delete(SESSIONS, token).await?;

        Ok(())
    }

    async fn resolve(&self, token: &str) -> Result<Option<Identity>, IdentityError> {
        Ok(get_typed(&*self.store, SESSIONS, token).await?)
    }

    async fn delete_user(&self, token: &str) -> Result<Identity, IdentityError> {
        let identity = self
            .resolve(token)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        if Utc::now() - identity.signed_in_at > self.recent_login {
            return Err(IdentityError::RequiresRecentLogin);
        }

        self.store.delete(ACCOUNTS, &identity.email).await?;

        for (session_token, value) in self.store.list(SESSIONS).await? {
            let owner: Identity = decode(SESSIONS, &session_token, value)?;
            if owner.uid == identity.uid {
                self.store.delete(SESSIONS, &session_token).await?;
            }
        }

        info!("Deleted account {}", identity.email);

        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{memory::MemoryStore, store::DocumentStore};

    fn provider(store: Arc<MemoryStore>) -> StoreIdentityProvider {
        StoreIdentityProvider::new(store, "pepper", Duration::minutes(5))
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let store = Arc::new(MemoryStore::new());
        let idp = provider(store.clone());

        let created = idp.sign_up("cook@pantry.dev", "hunter22").await.unwrap();
        let credential = idp.sign_in("cook@pantry.dev", "hunter22").await.unwrap();

        assert_eq!(credential.identity.uid, created.uid);
        assert_eq!(
            idp.resolve(&credential.token).await.unwrap(),
            Some(credential.identity)
        );
    }

    #[tokio::test]
    async fn test_password_is_not_stored_plain() {
        let store = Arc::new(MemoryStore::new());
        let idp = provider(store.clone());
        idp.sign_up("cook@pantry.dev", "hunter22").await.unwrap();

        let stored = store.get(ACCOUNTS, "cook@pantry.dev").await.unwrap().unwrap();
        assert!(!stored.to_string().contains("hunter22"));
    }

    #[test]
    fn test_same_hash() {
        let idp = provider(Arc::new(MemoryStore::new()));
        let hash = idp.hash("salt", "hunter22");

        assert!(same_hash(&hash, &idp.hash("salt", "hunter22")));
        assert!(!same_hash(&hash, &idp.hash("salt", "hunter23")));
        assert!(!same_hash(&hash, &idp.hash("pepper", "hunter22")));
        assert!(!same_hash(&hash, &hash[1..]));
        assert!(!same_hash(&hash, ""));
    }

    #[tokio::test]
    async fn test_sign_up_rejections() {
        let idp = provider(Arc::new(MemoryStore::new()));

        assert!(matches!(
            idp.sign_up("cook@pantry.dev", "12345").await,
            Err(IdentityError::WeakPassword(6))
        ));

        idp.sign_up("cook@pantry.dev", "123456").await.unwrap();
        assert!(matches!(
            idp.sign_up("cook@pantry.dev", "abcdef").await,
            Err(IdentityError::EmailInUse)
        ));
    }

    #[tokio::test]
    async fn test_sign_in_rejections() {
        let idp = provider(Arc::new(MemoryStore::new()));
        idp.sign_up("cook@pantry.dev", "hunter22").await.unwrap();

        assert!(matches!(
            idp.sign_in("cook@pantry.dev", "hunter23").await,
            Err(IdentityError::InvalidCredentials)
        ));
        assert!(matches!(
            idp.sign_in("nobody@pantry.dev", "hunter22").await,
            Err(IdentityError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_sign_out_forgets_token() {
        let idp = provider(Arc::new(MemoryStore::new()));
        idp.sign_up("cook@pantry.dev", "hunter22").await.unwrap();
        let credential = idp.sign_in("cook@pantry.dev", "hunter22").await.unwrap();

        idp.sign_out(&credential.token).await.unwrap();
        assert!(idp.resolve(&credential.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_user_drops_all_sessions() {
        let store = Arc::new(MemoryStore::new());
        let idp = provider(store.clone());
        idp.sign_up("cook@pantry.dev", "hunter22").await.unwrap();
        idp.sign_up("baker@pantry.dev", "hunter22").await.unwrap();
        let first = idp.sign_in("cook@pantry.dev", "hunter22").await.unwrap();
        let second = idp.sign_in("cook@pantry.dev", "hunter22").await.unwrap();
        let other = idp.sign_in("baker@pantry.dev", "hunter22").await.unwrap();

        idp.delete_user(&first.token).await.unwrap();

        assert!(idp.resolve(&second.token).await.unwrap().is_none());
        assert!(idp.resolve(&other.token).await.unwrap().is_some());
        assert!(matches!(
            idp.sign_in("cook@pantry.dev", "hunter22").await,
            Err(IdentityError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_delete_user_requires_recent_login() {
        let store = Arc::new(MemoryStore::new());
        let idp = provider(store.clone());
        idp.sign_up("cook@pantry.dev", "hunter22").await.unwrap();

        let stale = Identity {
            uid: "old".to_string(),
            email: "cook@pantry.dev".to_string(),
            signed_in_at: Utc::now() - Duration::minutes(30),
        };
        store
            .set(SESSIONS, "stale", json!(stale))
            .await
            .unwrap();

        assert!(matches!(
            idp.delete_user("stale").await,
            Err(IdentityError::RequiresRecentLogin)
        ));
        assert!(store.get(ACCOUNTS, "cook@pantry.dev").await.unwrap().is_some());
    }
}
