//! # Accounts
//!
//! Sign-up, sign-in, sign-out and account deletion on top of an
//! [`IdentityProvider`], plus the profile kept in the `users` collection.
//!
//! ## Flow
//!
//! - Sign-up validates the form, creates the identity, then writes the profile
//!   `{ firstName, email }` keyed by the email as typed
//! - Sign-in marks the caller's [`Session`] authenticated
//! - Sign-out and deletion leave it unauthenticated
//! - Deletion removes the profile as well as the identity. The session is
//!   signed out as soon as the identity is gone, even if the profile delete
//!   then fails
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{IdentityError, PantryError},
    identity::{Credential, Identity, IdentityProvider},
    session::Session,
    store::{SharedStore, USERS, get_typed, set_typed},
};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+$").expect("email pattern compiles")
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub first_name: String,
    pub email: String,
}

pub struct Accounts {
    identity: Arc<dyn IdentityProvider>,
    store: SharedStore,
}

impl Accounts {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: SharedStore) -> Self {
        Self { identity, store }
    }

    pub async fn sign_up(
        &self,
        first_name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, PantryError> {
        if first_name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(IdentityError::MissingFields.into());
        }
        if !EMAIL.is_match(email) {
            return Err(IdentityError::InvalidEmail.into());
        }

        self.identity.sign_up(email, password).await?;

        let profile = UserProfile {
            first_name: first_name.to_string(),
            email: email.to_string(),
        };
        set_typed(&*self.store, USERS, email, &profile).await?;

        info!("Created profile for {email}");
        Ok(profile)
    }

    pub async fn sign_in(
        &self,
        session: &Session,
        email: &str,
        password: &str,
    ) -> Result<Credential, PantryError> {
        if email.is_empty() || password.is_empty() {
            return Err(IdentityError::MissingCredentials.into());
        }

        let credential = self.identity.sign_in(email, password).await?;
        session.sign_in(credential.identity.clone());

        Ok(credential)
    }

    pub async fn sign_out(&self, session: &Session, token: &str) -> Result<(), PantryError> {
        self.identity.sign_out(token).await?;
        session.sign_out();

        Ok(())
    }

    /// Session for a bearer token, anonymous when the token is unknown.
    pub async fn session_for(&self, token: Option<&str>) -> Result<Session, PantryError> {
        let identity = match token {
            Some(token) => self.identity.resolve(token).await?,
            None => None,
        };

        Ok(identity.map(Session::authenticated).unwrap_or_default())
    }

    pub async fn delete_account(
        &self,
        session: &Session,
        token: &str,
    ) -> Result<Identity, PantryError> {
        let identity = self.identity.delete_user(token).await?;
        session.sign_out();
        self.store.delete(USERS, &identity.email).await?;

        Ok(identity)
    }

    pub async fn profile(&self, email: &str) -> Result<UserProfile, PantryError> {
        get_typed(&*self.store, USERS, email)
            .await?
            .ok_or_else(|| PantryError::NotFound(email.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{identity::StoreIdentityProvider, memory::MemoryStore, store::DocumentStore};

    fn accounts() -> (Arc<MemoryStore>, Accounts) {
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(StoreIdentityProvider::new(
            store.clone(),
            "",
            Duration::minutes(5),
        ));

        (store.clone(), Accounts::new(identity, store))
    }

    #[tokio::test]
    async fn test_sign_up_writes_profile() {
        let (store, accounts) = accounts();

        accounts
            .sign_up("Ada", "ada@pantry.dev", "hunter22")
            .await
            .unwrap();

        let profile = store.get(USERS, "ada@pantry.dev").await.unwrap().unwrap();
        assert_eq!(
            profile,
            serde_json::json!({ "firstName": "Ada", "email": "ada@pantry.dev" })
        );
        assert_eq!(
            accounts.profile("ada@pantry.dev").await.unwrap().first_name,
            "Ada"
        );
    }

    #[tokio::test]
    async fn test_sign_up_validation() {
        let (store, accounts) = accounts();

        let missing = accounts.sign_up("", "ada@pantry.dev", "hunter22").await;
        assert_eq!(missing.unwrap_err().to_string(), "All fields are required.");

        let invalid = accounts.sign_up("Ada", "ada at pantry", "hunter22").await;
        assert_eq!(
            invalid.unwrap_err().to_string(),
            "Please enter a valid email address."
        );

        let weak = accounts.sign_up("Ada", "ada@pantry.dev", "abc").await;
        assert!(matches!(
            weak,
            Err(PantryError::Identity(IdentityError::WeakPassword(_)))
        ));

        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_sign_in_updates_session() {
        let (_, accounts) = accounts();
        accounts
            .sign_up("Ada", "ada@pantry.dev", "hunter22")
            .await
            .unwrap();
        let session = Session::anonymous();
        let watcher = session.subscribe();

        let credential = accounts
            .sign_in(&session, "ada@pantry.dev", "hunter22")
            .await
            .unwrap();
        assert_eq!(
            watcher.borrow().as_ref().map(|i| i.uid.clone()),
            Some(credential.identity.uid.clone())
        );

        let resolved = accounts.session_for(Some(&credential.token)).await.unwrap();
        assert!(resolved.is_authenticated());

        accounts.sign_out(&session, &credential.token).await.unwrap();
        assert!(!session.is_authenticated());
        assert!(
            !accounts
                .session_for(Some(&credential.token))
                .await
                .unwrap()
                .is_authenticated()
        );
    }

    #[tokio::test]
    async fn test_sign_in_failure_message() {
        let (_, accounts) = accounts();
        let session = Session::anonymous();

        let err = accounts
            .sign_in(&session, "ada@pantry.dev", "nope")
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Incorrect email or password. Please try again."
        );
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_in_missing_credentials() {
        let (store, accounts) = accounts();
        let session = Session::anonymous();

        let err = accounts.sign_in(&session, "", "hunter22").await.unwrap_err();
        assert!(matches!(
            err,
            PantryError::Identity(IdentityError::MissingCredentials)
        ));
        assert_eq!(
            err.to_string(),
            "Please fill in both email and password to sign in."
        );

        assert!(matches!(
            accounts.sign_in(&session, "ada@pantry.dev", "").await,
            Err(PantryError::Identity(IdentityError::MissingCredentials))
        ));
        assert!(!session.is_authenticated());
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_unknown_token_is_anonymous() {
        let (_, accounts) = accounts();

        assert!(!accounts.session_for(Some("bogus")).await.unwrap().is_authenticated());
        assert!(!accounts.session_for(None).await.unwrap().is_authenticated());
    }

    #[tokio::test]
    async fn test_delete_account_removes_profile() {
        let (store, accounts) = accounts();
        accounts
            .sign_up("Ada", "ada@pantry.dev", "hunter22")
            .await
            .unwrap();
        let session = Session::anonymous();
        let credential = accounts
            .sign_in(&session, "ada@pantry.dev", "hunter22")
            .await
            .unwrap();

        accounts
            .delete_account(&session, &credential.token)
            .await
            .unwrap();

        assert!(!session.is_authenticated());
        assert!(store.get(USERS, "ada@pantry.dev").await.unwrap().is_none());
        assert!(matches!(
            accounts.profile("ada@pantry.dev").await,
            Err(PantryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_account_signs_out_when_profile_delete_fails() {
        let identities = Arc::new(MemoryStore::new());
        let profiles = Arc::new(MemoryStore::new());
        let accounts = Accounts::new(
            Arc::new(StoreIdentityProvider::new(
                identities,
                "",
                Duration::minutes(5),
            )),
            profiles.clone(),
        );
        accounts
            .sign_up("Ada", "ada@pantry.dev", "hunter22")
            .await
            .unwrap();
        let session = Session::anonymous();
        let credential = accounts
            .sign_in(&session, "ada@pantry.dev", "hunter22")
            .await
            .unwrap();

        profiles.set_offline(true);
        let result = accounts.delete_account(&session, &credential.token).await;

        assert!(matches!(result, Err(PantryError::Store(_))));
        assert!(!session.is_authenticated());
        assert!(
            !accounts
                .session_for(Some(&credential.token))
                .await
                .unwrap()
                .is_authenticated()
        );
    }
}
