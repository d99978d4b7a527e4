//! Local accounts for the recipe keeper.

pub mod credentials;
pub mod error;
pub mod password;
pub mod user;

pub use credentials::{CredentialStore, SESSION_KEY, USERS_KEY};
pub use error::AuthError;
pub use user::{Credentials, Role, SignUpData, User};
