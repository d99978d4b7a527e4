//! # Account model
//!
//! ## [`User`]
//!
//! The profile shown to the app and kept in the session slot. It never
//! carries credential material.
//!
//! ## `StoredUser`
//!
//! One element of the users slot: a [`User`] plus its credential. Current
//! records hold an Argon2 `passwordHash`. Records written before hashing was
//! introduced hold a plaintext `password` instead; the credential store
//! upgrades those on the next successful sign-in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use store::ValidationError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub pseudo: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredUser {
    #[serde(flatten)]
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Legacy plaintext credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignUpData {
    pub email: String,
    pub password: String,
    pub pseudo: String,
    pub first_name: String,
    pub last_name: String,
}

impl SignUpData {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::Missing("email"));
        }
        if !self.email.contains('@') {
            return Err(ValidationError::Invalid("email"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::Missing("password"));
        }
        if self.pseudo.trim().is_empty() {
            return Err(ValidationError::Missing("username"));
        }
        Ok(())
    }
}
