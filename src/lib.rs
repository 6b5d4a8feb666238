//! # Pantry Documentation
//!
//! Pantry inventory tracker.
//!
//! Users sign up, sign in, add and remove named items with whole quantities, and
//! search for a single item.
//!
//! ## Crates
//!
//! - `pantry` (this crate): inventory rules, session, accounts, store seams
//! - `server`: HTTP service over Redis
//! - `backend`: server binary
//! - `tester`: terminal client for the HTTP service
//!
//! ## Collections
//!
//! - `inventory`: item name to `{ quantity }`
//! - `users`: email to `{ firstName, email }`
//! - `accounts`, `sessions`: owned by [`identity::StoreIdentityProvider`]
//!
//! ## Notes
//!
//! ### Names
//! Adding or removing uses the name exactly as typed. Searching looks up the
//! trimmed, lower-cased query. So `Milk` added by hand is never found by a
//! search, while `milk` created from a search is.
//!
//! ### Concurrency
//! No transactions. See [`inventory`] for the lost update this allows.
//!
//!
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
//!
//! Run the server against a local Redis.
//! ```sh
//! REDIS_URL=redis://127.0.0.1:6379 RUST_LOG=info cargo run -p backend
//! ```
//!
//! Talk to it.
//! ```sh
//! cargo run -p tester -- --url http://127.0.0.1:1111
//! ```

pub mod account;
pub mod error;
pub mod identity;
pub mod inventory;
pub mod memory;
pub mod session;
pub mod store;
pub mod view;

pub use account::{Accounts, UserProfile};
pub use error::{IdentityError, PantryError};
pub use identity::{Credential, Identity, IdentityProvider, StoreIdentityProvider};
pub use inventory::{InventoryEngine, InventoryItem, Removal, SearchOutcome, SearchResult};
pub use memory::MemoryStore;
pub use session::Session;
pub use store::{DocumentStore, SharedStore, StoreError};
pub use view::ItemView;
