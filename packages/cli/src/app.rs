use std::sync::Arc;

use auth::CredentialStore;
use store::{
    ChangeNotifier, FileStore, KeyValueStore, MadeEntryRepository, RecipeKeeperConfig,
    RecipeRepository,
};
use sync::{ConnectivityMonitor, SimulatedRemote, SyncManager};

/// Everything one process needs, opened over a single store.
pub(crate) struct App {
    pub config: RecipeKeeperConfig,
    pub store: FileStore,
    pub recipes: RecipeRepository,
    pub entries: MadeEntryRepository,
    pub accounts: CredentialStore,
    pub connectivity: ConnectivityMonitor,
}

impl App {
    pub fn open(config: RecipeKeeperConfig, online: bool) -> Self {
        let namespace = config.storage.namespace.as_deref();
        let store = match (&config.storage.dir, namespace) {
            (Some(dir), Some(ns)) => FileStore::new(dir.join(ns)),
            (Some(dir), None) => FileStore::new(dir.clone()),
            (None, ns) => FileStore::with_namespace(ns),
        };
        tracing::debug!(base = %store.base().display(), "opening store");

        let shared: Arc<dyn KeyValueStore> = Arc::new(store.clone());
        let notifier = ChangeNotifier::new();
        Self {
            recipes: RecipeRepository::from_shared(shared.clone(), notifier.clone()),
            entries: MadeEntryRepository::from_shared(shared.clone(), notifier),
            accounts: CredentialStore::from_shared(shared),
            connectivity: ConnectivityMonitor::new(online),
            store,
            config,
        }
    }

    pub fn sync_manager(&self) -> SyncManager {
        SyncManager::for_repositories(
            &self.recipes,
            &self.entries,
            SimulatedRemote::new(self.config.remote_latency()),
            self.connectivity.clone(),
            self.config.sync_interval(),
        )
    }
}
