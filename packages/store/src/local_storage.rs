//! # Browser localStorage store — web persistence
//!
//! [`LocalStorageStore`] is the [`KeyValueStore`] used on the **web platform**.
//! `window.localStorage` is synchronous and commits before `setItem` returns,
//! which is exactly the contract the repositories rely on.
//!
//! ## Namespacing
//!
//! Keys are written verbatim for the default store. A namespaced store
//! prefixes them with `"<namespace>:"`, giving each signed-in user an
//! isolated set of collections on the same origin.
//!
//! ## Error handling
//!
//! Reads swallow errors and return `None` (a blocked or missing storage area
//! degrades to "no local data"). Writes report
//! [`StoreError::Unavailable`], which covers quota exhaustion.

use wasm_bindgen::JsValue;
use web_sys::Storage;

use crate::error::StoreError;
use crate::kv::KeyValueStore;

/// localStorage-backed KeyValueStore for the web platform.
#[derive(Clone, Debug, Default)]
pub struct LocalStorageStore {
    prefix: String,
}

impl LocalStorageStore {
    /// Store writing keys verbatim.
    pub fn new() -> Self {
        Self::with_namespace(None)
    }

    /// Store scoped to an optional user namespace.
    pub fn with_namespace(namespace: Option<&str>) -> Self {
        let prefix = match namespace {
            Some(ns) => format!("{ns}:"),
            None => String::new(),
        };
        Self { prefix }
    }

    fn storage() -> Result<Storage, StoreError> {
        let window = web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window".to_string()))?;
        window
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".to_string()))
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

fn js_error(value: JsValue) -> StoreError {
    StoreError::Unavailable(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

impl KeyValueStore for LocalStorageStore {
    fn read(&self, key: &str) -> Option<String> {
        let storage = Self::storage().ok()?;
        storage.get_item(&self.full_key(key)).ok().flatten()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::storage()?
            .set_item(&self.full_key(key), value)
            .map_err(js_error)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        Self::storage()?
            .remove_item(&self.full_key(key))
            .map_err(js_error)
    }
}
