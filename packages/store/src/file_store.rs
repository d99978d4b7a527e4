//! # Filesystem-backed key-value store
//!
//! [`FileStore`] is a [`KeyValueStore`] implementation that persists each key
//! as one file under a base directory. It is used by the command-line front
//! end (and would be by any desktop shell) to retain recipes across restarts.
//!
//! ## Layout
//!
//! ```text
//! <base_dir>/
//! ├── recipe-keeper-recipes.json
//! ├── recipe-keeper-made-entries.json
//! ├── recipe_app_users.json
//! └── recipe_app_session.json
//! ```
//!
//! Writes go to a uniquely named temporary file in the same directory, are
//! flushed with `sync_all`, then renamed over the target. A reader sees either
//! the previous value or the new one, and concurrent writers (two processes
//! over the same directory) never share a temporary file: each commit lands
//! whole and the last rename wins.
//!
//! ## Platform data directories
//!
//! [`FileStore::default_base`] uses [`dirs::data_dir()`]:
//!
//! | Platform | Path |
//! |----------|------|
//! | macOS | `~/Library/Application Support/recipe-keeper/` |
//! | Linux | `~/.local/share/recipe-keeper/` |
//! | Windows | `C:\Users\<user>\AppData\Roaming\recipe-keeper\` |

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::kv::KeyValueStore;

/// Filesystem-backed KeyValueStore for desktop persistence.
#[derive(Clone, Debug)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    /// Store scoped to an optional user namespace under the platform data dir.
    ///
    /// - `Some("user-uuid")` → `<data_dir>/recipe-keeper/user-uuid/`
    /// - `None` → `<data_dir>/recipe-keeper/`
    pub fn with_namespace(namespace: Option<&str>) -> Self {
        let base = Self::default_base();
        match namespace {
            Some(ns) => Self::new(base.join(ns)),
            None => Self::new(base),
        }
    }

    /// `<data_dir>/recipe-keeper`, or `./recipe-keeper` when the platform has none.
    pub fn default_base() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("recipe-keeper")
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }

    fn io_error(key: &str, source: std::io::Error) -> StoreError {
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.slot_path(key)).ok()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base).map_err(|e| Self::io_error(key, e))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{key}."))
            .suffix(".tmp")
            .tempfile_in(&self.base)
            .map_err(|e| Self::io_error(key, e))?;
        tmp.write_all(value.as_bytes())
            .map_err(|e| Self::io_error(key, e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| Self::io_error(key, e))?;
        tmp.persist(self.slot_path(key))
            .map_err(|e| Self::io_error(key, e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.slot_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }
}
