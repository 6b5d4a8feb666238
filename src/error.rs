use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum PantryError {
    #[error("You need to be signed in to {action} items.")]
    Unauthenticated { action: &'static str },

    #[error("Please enter an item {0}.")]
    EmptyInput(&'static str),

    #[error("Item: {0} is not available.")]
    NotFound(String),

    #[error("Item: {0} is already at the largest quantity that can be stored.")]
    QuantityLimit(String),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("All fields are required.")]
    MissingFields,

    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("Password should be at least {0} characters.")]
    WeakPassword(usize),

    #[error("An account already exists for this email address.")]
    EmailInUse,

    #[error("Please fill in both email and password to sign in.")]
    MissingCredentials,

    #[error("Incorrect email or password. Please try again.")]
    InvalidCredentials,

    #[error("Please sign in again before deleting your account.")]
    RequiresRecentLogin,

    #[error(transparent)]
    Store(#[from] StoreError),
}
