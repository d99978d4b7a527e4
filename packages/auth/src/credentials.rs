//! # Credential store — local accounts and the current session
//!
//! Accounts live in one slot of the [`KeyValueStore`] (`recipe_app_users`),
//! the signed-in user in another (`recipe_app_session`). Both use the same
//! JSON codec as the entity collections, so an unreadable slot reads as "no
//! accounts" or "signed out".
//!
//! | Operation | Checks | Effect |
//! |-----------|--------|--------|
//! | [`sign_up`](CredentialStore::sign_up) | email and pseudo unused (Unicode lowercase comparison) | appends the account with an Argon2 hash, opens a session |
//! | [`sign_in`](CredentialStore::sign_in) | email known, password matches | opens a session, upgrades a legacy plaintext record |
//! | [`sign_out`](CredentialStore::sign_out) | none | clears the session |
//! | [`current_user`](CredentialStore::current_user) | none | reads the session |

use std::sync::Arc;

use chrono::Utc;
use store::kv::{clear_slot, load_collection, load_slot, save_collection, save_slot};
use store::KeyValueStore;

use crate::error::AuthError;
use crate::password::{hash_password, verify_password};
use crate::user::{Credentials, Role, SignUpData, StoredUser, User};

pub const USERS_KEY: &str = "recipe_app_users";
pub const SESSION_KEY: &str = "recipe_app_session";

#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new<S: KeyValueStore + 'static>(store: S) -> Self {
        Self::from_shared(Arc::new(store))
    }

    pub fn from_shared(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn accounts(&self) -> Vec<StoredUser> {
        load_collection(self.store.as_ref(), USERS_KEY)
    }

    fn open_session(&self, user: &User) -> Result<(), AuthError> {
        save_slot(self.store.as_ref(), SESSION_KEY, user)?;
        Ok(())
    }

    /// Create an account and sign it in.
    pub fn sign_up(&self, data: SignUpData) -> Result<User, AuthError> {
        data.validate()?;
        let mut accounts = self.accounts();

        let email = data.email.to_lowercase();
        let pseudo = data.pseudo.to_lowercase();
        if accounts.iter().any(|a| a.user.email.to_lowercase() == email) {
            return Err(AuthError::EmailTaken);
        }
        if accounts.iter().any(|a| a.user.pseudo.to_lowercase() == pseudo) {
            return Err(AuthError::PseudoTaken);
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: data.email,
            pseudo: data.pseudo,
            first_name: data.first_name,
            last_name: data.last_name,
            role: Role::User,
            created_at: Utc::now(),
        };
        accounts.push(StoredUser {
            user: user.clone(),
            password_hash: Some(hash_password(&data.password)?),
            password: None,
        });
        save_collection(self.store.as_ref(), USERS_KEY, &accounts)?;
        self.open_session(&user)?;

        tracing::info!(user_id = %user.id, pseudo = %user.pseudo, "account created");
        Ok(user)
    }

    /// Check `credentials` and open a session.
    pub fn sign_in(&self, credentials: Credentials) -> Result<User, AuthError> {
        let mut accounts = self.accounts();
        let email = credentials.email.to_lowercase();
        let Some(index) = accounts
            .iter()
            .position(|a| a.user.email.to_lowercase() == email)
        else {
            return Err(AuthError::UnknownEmail);
        };

        let account = accounts[index].clone();
        match (account.password_hash, account.password) {
            (Some(hash), _) => {
                if !verify_password(&credentials.password, &hash)? {
                    return Err(AuthError::IncorrectPassword);
                }
            }
            (None, Some(plain)) => {
                // Hash the stored plaintext and verify against that
                let hash = hash_password(&plain)?;
                if !verify_password(&credentials.password, &hash)? {
                    return Err(AuthError::IncorrectPassword);
                }
                accounts[index].password_hash = Some(hash);
                accounts[index].password = None;
                save_collection(self.store.as_ref(), USERS_KEY, &accounts)?;
                tracing::info!(user_id = %account.user.id, "upgraded legacy plaintext credential");
            }
            (None, None) => return Err(AuthError::IncorrectPassword),
        }

        let user = account.user;
        self.open_session(&user)?;
        tracing::info!(user_id = %user.id, pseudo = %user.pseudo, "signed in");
        Ok(user)
    }

    pub fn sign_out(&self) -> Result<(), AuthError> {
        clear_slot(self.store.as_ref(), SESSION_KEY)?;
        tracing::info!("signed out");
        Ok(())
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Option<User> {
        load_slot(self.store.as_ref(), SESSION_KEY)
    }
}
