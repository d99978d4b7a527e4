//! # Key-value persistence — the primitive every collection sits on
//!
//! [`KeyValueStore`] is the storage seam of the workspace. It stores one
//! serialized value per key and commits synchronously: when [`write`] returns
//! `Ok`, the value is durable and every other handle on the same backend
//! observes it on its next [`read`].
//!
//! Implementations live in sibling modules:
//!
//! | Backend | Module | Used by |
//! |---------|--------|---------|
//! | [`crate::MemoryStore`] | `memory` | tests, and several in-process contexts sharing one origin |
//! | [`crate::FileStore`] | `file_store` | desktop / CLI persistence |
//! | `LocalStorageStore` | `local_storage` | the browser (`wasm32` + `web` feature) |
//!
//! ## Codec
//!
//! Collections are stored as a JSON array of records in a single slot, and the
//! session as a single JSON object. The helpers below own the JSON mapping:
//!
//! | Function | Missing value | Corrupt value |
//! |----------|---------------|---------------|
//! | [`load_collection`] | empty `Vec` | empty `Vec`, logged at `warn` |
//! | [`load_slot`] | `None` | `None`, logged at `warn` |
//!
//! Writes always replace the whole value; there are no deltas.
//!
//! [`write`]: KeyValueStore::write
//! [`read`]: KeyValueStore::read

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

/// Synchronous key-value storage holding one serialized value per key.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`.
    fn read(&self, key: &str) -> Option<String>;

    /// Replace the value stored under `key`. Durable once this returns `Ok`.
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Whether anything is stored under `key`.
    fn contains(&self, key: &str) -> bool {
        self.read(key).is_some()
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn read(&self, key: &str) -> Option<String> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Decode a stored collection. Missing or undecodable values read as empty.
pub fn load_collection<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Vec<T> {
    let Some(raw) = store.read(key) else {
        return Vec::new();
    };
    decode_collection(key, &raw)
}

/// Decode a raw collection value, treating corruption as an empty collection.
pub fn decode_collection<T: DeserializeOwned>(key: &str, raw: &str) -> Vec<T> {
    match serde_json::from_str(raw) {
        Ok(items) => items,
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding unreadable collection");
            Vec::new()
        }
    }
}

/// Encode and persist a whole collection.
pub fn save_collection<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(items).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.write(key, &raw)?;
    tracing::debug!(key, records = items.len(), "collection committed");
    Ok(())
}

/// Decode a single-record slot such as the current session.
pub fn load_slot<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.read(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding unreadable slot");
            None
        }
    }
}

/// Encode and persist a single-record slot.
pub fn save_slot<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.write(key, &raw)
}

/// Empty a single-record slot.
pub fn clear_slot(store: &dyn KeyValueStore, key: &str) -> Result<(), StoreError> {
    store.remove(key)
}
