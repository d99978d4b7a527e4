use store::{StoreError, ValidationError};
use thiserror::Error;

/// Why a sign-up or sign-in was refused.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("This username is already taken")]
    PseudoTaken,

    #[error("No account found with this email address")]
    UnknownEmail,

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
