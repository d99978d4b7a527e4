pub mod config;
pub mod digest;
pub mod error;
pub mod kv;
pub mod models;
pub mod notify;
pub mod repo;
pub mod seed;
pub mod view;

mod memory;
pub use memory::MemoryStore;

#[cfg(not(target_arch = "wasm32"))]
mod file_store;
#[cfg(not(target_arch = "wasm32"))]
pub use file_store::FileStore;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
mod local_storage;
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use local_storage::LocalStorageStore;

pub use config::RecipeKeeperConfig;
pub use error::{StoreError, ValidationError};
pub use kv::KeyValueStore;
pub use models::{CollectionKey, MadeEntry, MadeEntryInput, Recipe, RecipeInput, Record};
pub use notify::{ChangeEvent, ChangeNotifier, ChangeOrigin};
pub use repo::{Collection, MadeEntryRepository, RecipeRepository};
pub use view::LiveView;
