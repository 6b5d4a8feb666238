//! # Session
//!
//! Who the current client is, if anyone.
//!
//! A session is handed to every operation that needs to know. Changes are
//! published on a watch channel so that views can follow sign-in and sign-out
//! without polling. Subscribers see the state current at subscription time first.
use tokio::sync::watch;

use crate::identity::Identity;

#[derive(Clone, Debug)]
pub struct Session {
    state: watch::Sender<Option<Identity>>,
}

impl Session {
    pub fn anonymous() -> Self {
        let (state, _) = watch::channel(None);
        Self { state }
    }

    pub fn authenticated(identity: Identity) -> Self {
        let (state, _) = watch::channel(Some(identity));
        Self { state }
    }

    pub fn current(&self) -> Option<Identity> {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_some()
    }

    pub fn sign_in(&self, identity: Identity) {
        self.state.send_replace(Some(identity));
    }

    pub fn sign_out(&self) {
        self.state.send_replace(None);
    }

    /// Receiver that yields the identity, or `None`, on every change.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.state.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}
