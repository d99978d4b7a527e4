//! # Sync manager — reconciling dirty records with the remote
//!
//! [`SyncManager`] owns the list of [`SyncTarget`]s (the recipes and made
//! entries collections), the [`Remote`] and the [`ConnectivityMonitor`]. It
//! runs reconciliation passes:
//!
//! 1. If offline, do nothing ([`SyncOutcome::Offline`]).
//! 2. If a pass is already running, drop this trigger ([`SyncOutcome::Busy`]).
//!    Triggers are never queued.
//! 3. For each target: skip it when nothing is dirty; otherwise exchange it
//!    with the remote, then mark synced the records that did not change in
//!    the meantime. That write publishes one change event per collection.
//! 4. On the first failed exchange, stop. Nothing in that collection is marked
//!    synced, a [`SyncNotice::failed`] is published and the next trigger
//!    retries.
//!
//! ## Triggers
//!
//! | Trigger | When |
//! |---------|------|
//! | Reconnect | the monitor goes from offline to online (and once at start when online) |
//! | Timer | every `interval` while online (30 s by default) |
//! | Manual | [`SyncManager::sync_now`] |
//!
//! [`SyncManager::start`] spawns the trigger loop. Each pass it starts runs
//! on its own task, so a trigger firing mid-pass reaches the in-flight guard
//! and is dropped. The loop lives until its [`SyncHandle`] is dropped; a pass
//! that already started always runs to completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use store::{CollectionKey, MadeEntryRepository, RecipeRepository};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::connectivity::ConnectivityMonitor;
use crate::notice::{SyncNotice, SyncStatus};
use crate::remote::Remote;
use crate::target::{Reconciled, SyncTarget};

const NOTICE_CAPACITY: usize = 16;

/// What one call to [`SyncManager::sync_now`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Not attempted: no connectivity.
    Offline,
    /// Not attempted: another pass is in flight.
    Busy,
    /// Nothing was dirty.
    Clean,
    /// These collections were exchanged and marked synced.
    Synced(Vec<CollectionKey>),
    /// The exchange of `collection` failed; `synced` lists collections done before it.
    Failed {
        collection: CollectionKey,
        error: String,
        synced: Vec<CollectionKey>,
    },
}

/// Orchestrates reconciliation passes. Cheap to clone.
#[derive(Clone)]
pub struct SyncManager {
    inner: Arc<Inner>,
}

struct Inner {
    targets: Vec<Arc<dyn SyncTarget>>,
    remote: Arc<dyn Remote>,
    connectivity: ConnectivityMonitor,
    interval: Option<Duration>,
    in_flight: AtomicBool,
    notices: broadcast::Sender<SyncNotice>,
}

/// Holds the in-flight flag for the duration of one pass.
struct PassGuard<'a>(&'a AtomicBool);

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassGuard(flag))
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncManager {
    /// `interval` of `None` disables the timer trigger.
    pub fn new<R: Remote + 'static>(
        targets: Vec<Arc<dyn SyncTarget>>,
        remote: R,
        connectivity: ConnectivityMonitor,
        interval: Option<Duration>,
    ) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                targets,
                remote: Arc::new(remote),
                connectivity,
                interval,
                in_flight: AtomicBool::new(false),
                notices,
            }),
        }
    }

    /// Manager over the recipes and made-entries collections, in that order.
    pub fn for_repositories<R: Remote + 'static>(
        recipes: &RecipeRepository,
        entries: &MadeEntryRepository,
        remote: R,
        connectivity: ConnectivityMonitor,
        interval: Option<Duration>,
    ) -> Self {
        let targets: Vec<Arc<dyn SyncTarget>> = vec![
            Arc::new(recipes.collection().clone()),
            Arc::new(entries.collection().clone()),
        ];
        Self::new(targets, remote, connectivity, interval)
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.inner.connectivity
    }

    pub fn is_online(&self) -> bool {
        self.inner.connectivity.is_online()
    }

    /// Whether a pass is running right now.
    pub fn is_syncing(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Total dirty records across all targets.
    pub fn dirty_count(&self) -> usize {
        self.inner.targets.iter().map(|t| t.dirty_count()).sum()
    }

    pub fn has_unsynced(&self) -> bool {
        self.inner.targets.iter().any(|t| t.dirty_count() > 0)
    }

    /// State for a sync indicator.
    pub fn status(&self) -> SyncStatus {
        SyncStatus::from_state(self.is_online(), self.dirty_count())
    }

    /// Receive the user-facing notices of following passes.
    pub fn notices(&self) -> broadcast::Receiver<SyncNotice> {
        self.inner.notices.subscribe()
    }

    fn publish(&self, notice: SyncNotice) {
        let _ = self.inner.notices.send(notice);
    }

    /// Run one reconciliation pass now.
    pub async fn sync_now(&self) -> SyncOutcome {
        if !self.is_online() {
            return SyncOutcome::Offline;
        }
        let Some(_pass) = PassGuard::acquire(&self.inner.in_flight) else {
            tracing::debug!("sync trigger dropped, pass in flight");
            return SyncOutcome::Busy;
        };

        let mut synced = Vec::new();
        for target in &self.inner.targets {
            let collection = target.collection();
            match target.reconcile(self.inner.remote.as_ref()).await {
                Ok(Reconciled::Clean) => {}
                Ok(Reconciled::Synced { records: 0 }) => {
                    tracing::debug!(%collection, "exchange done, every record changed meanwhile");
                }
                Ok(Reconciled::Synced { records }) => {
                    tracing::info!(%collection, records, "collection synced");
                    synced.push(collection);
                }
                Err(err) => {
                    tracing::warn!(%collection, error = %err, "sync failed");
                    self.publish(SyncNotice::failed());
                    return SyncOutcome::Failed {
                        collection,
                        error: err.to_string(),
                        synced,
                    };
                }
            }
        }

        if synced.is_empty() {
            return SyncOutcome::Clean;
        }
        self.publish(SyncNotice::synced());
        SyncOutcome::Synced(synced)
    }

    /// Spawn the trigger loop. Dropping the handle stops it.
    pub fn start(&self) -> SyncHandle {
        let manager = self.clone();
        let task = tokio::spawn(async move { manager.run().await });
        SyncHandle { task }
    }

    async fn run(self) {
        let mut online = self.inner.connectivity.subscribe();
        let mut timer = self.inner.interval.map(|period| {
            let start = tokio::time::Instant::now() + period;
            let mut timer = tokio::time::interval_at(start, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            timer
        });

        if *online.borrow_and_update() {
            self.trigger("startup");
        }

        loop {
            tokio::select! {
                changed = online.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if *online.borrow_and_update() {
                        if let Some(timer) = timer.as_mut() {
                            timer.reset();
                        }
                        self.trigger("reconnect");
                    }
                }
                _ = tick(&mut timer) => {
                    if self.is_online() {
                        self.trigger("interval");
                    }
                }
            }
        }
    }

    /// Start a pass on its own task, unless one is already running.
    fn trigger(&self, reason: &'static str) {
        if self.is_syncing() {
            tracing::debug!(reason, "sync trigger dropped, pass in flight");
            return;
        }
        tracing::debug!(reason, "sync triggered");
        let manager = self.clone();
        tokio::spawn(async move {
            manager.sync_now().await;
        });
    }
}

async fn tick(timer: &mut Option<tokio::time::Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// The running trigger loop; stopped on drop.
pub struct SyncHandle {
    task: JoinHandle<()>,
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeLevel;
    use crate::remote::SimulatedRemote;
    use store::{ChangeNotifier, ChangeOrigin, MadeEntryInput, MemoryStore, RecipeInput};

    const LATENCY: Duration = Duration::from_secs(1);

    struct Fixture {
        recipes: RecipeRepository,
        entries: MadeEntryRepository,
        notifier: ChangeNotifier,
        remote: SimulatedRemote,
        manager: SyncManager,
    }

    fn fixture(online: bool) -> Fixture {
        let store = MemoryStore::new();
        let notifier = ChangeNotifier::new();
        let recipes = RecipeRepository::new(store.clone(), notifier.clone());
        let entries = MadeEntryRepository::new(store, notifier.clone());
        let remote = SimulatedRemote::new(LATENCY);
        let manager = SyncManager::for_repositories(
            &recipes,
            &entries,
            remote.clone(),
            ConnectivityMonitor::new(online),
            Some(Duration::from_secs(30)),
        );
        Fixture {
            recipes,
            entries,
            notifier,
            remote,
            manager,
        }
    }

    fn recipe(title: &str) -> RecipeInput {
        RecipeInput {
            title: title.to_string(),
            category: "Soups".to_string(),
            cook_time: 15,
            servings: 2,
            ..Default::default()
        }
    }

    fn made(recipe_id: &str, grade: u8) -> MadeEntryInput {
        MadeEntryInput {
            recipe_id: recipe_id.to_string(),
            grade,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_does_nothing() {
        let f = fixture(false);
        f.recipes.add(recipe("Miso")).unwrap();

        assert_eq!(f.manager.sync_now().await, SyncOutcome::Offline);
        assert_eq!(f.remote.exchanges(), 0);
        assert_eq!(f.manager.dirty_count(), 1);
        assert_eq!(f.manager.status(), SyncStatus::Offline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_collections_skip_the_remote() {
        let f = fixture(true);
        let mut events = f.notifier.subscribe();

        assert_eq!(f.manager.sync_now().await, SyncOutcome::Clean);
        assert_eq!(f.remote.exchanges(), 0);
        assert!(events.try_recv().is_err());
        assert_eq!(f.manager.status(), SyncStatus::UpToDate);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dirty_collections_are_synced() {
        let f = fixture(true);
        let soup = f.recipes.add(recipe("Miso")).unwrap();
        f.entries.add(made(&soup.id, 5)).unwrap();
        assert_eq!(f.manager.status(), SyncStatus::Pending { dirty: 2 });
        assert!(f.manager.has_unsynced());

        let mut events = f.notifier.subscribe();
        let mut notices = f.manager.notices();

        let outcome = f.manager.sync_now().await;
        assert_eq!(
            outcome,
            SyncOutcome::Synced(vec![CollectionKey::Recipes, CollectionKey::MadeEntries])
        );
        assert!(f.recipes.get(&soup.id).unwrap().synced);
        assert!(f.entries.list().iter().all(|e| e.synced));
        assert_eq!(f.remote.exchanges(), 2);

        // One change event per reconciled collection
        let first = events.try_recv().unwrap();
        let second = events.try_recv().unwrap();
        assert_eq!(first.collection, CollectionKey::Recipes);
        assert_eq!(second.collection, CollectionKey::MadeEntries);
        assert_eq!(first.origin, ChangeOrigin::Sync);
        assert!(events.try_recv().is_err());

        let notice = notices.try_recv().unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.message, "All changes synced!");

        assert!(!f.manager.has_unsynced());

        // A second pass finds nothing to do
        assert_eq!(f.manager.sync_now().await, SyncOutcome::Clean);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_during_pass_is_dropped() {
        let f = fixture(true);
        f.recipes.add(recipe("Miso")).unwrap();

        let manager = f.manager.clone();
        let first = tokio::spawn(async move { manager.sync_now().await });
        // Let the first pass reach the simulated exchange
        tokio::task::yield_now().await;
        assert!(f.manager.is_syncing());

        assert_eq!(f.manager.sync_now().await, SyncOutcome::Busy);
        assert_eq!(
            first.await.unwrap(),
            SyncOutcome::Synced(vec![CollectionKey::Recipes])
        );
        assert!(!f.manager.is_syncing());
        assert_eq!(f.remote.exchanges(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_records_dirty_and_retries() {
        let f = fixture(true);
        let soup = f.recipes.add(recipe("Miso")).unwrap();
        f.remote.set_failing(true);
        let mut notices = f.manager.notices();
        let mut events = f.notifier.subscribe();

        let outcome = f.manager.sync_now().await;
        assert!(matches!(
            outcome,
            SyncOutcome::Failed { collection: CollectionKey::Recipes, ref synced, .. } if synced.is_empty()
        ));
        assert!(!f.recipes.get(&soup.id).unwrap().synced);
        assert!(events.try_recv().is_err());

        let notice = notices.try_recv().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Sync failed. Will retry when online.");

        // Guard released; the next trigger succeeds
        f.remote.set_failing(false);
        assert_eq!(
            f.manager.sync_now().await,
            SyncOutcome::Synced(vec![CollectionKey::Recipes])
        );
        assert!(f.recipes.get(&soup.id).unwrap().synced);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_on_second_collection_keeps_first_synced() {
        let f = fixture(true);
        let soup = f.recipes.add(recipe("Miso")).unwrap();
        let entry = f.entries.add(made(&soup.id, 4)).unwrap();
        f.remote.set_rejecting(Some(CollectionKey::MadeEntries));
        let mut notices = f.manager.notices();
        let mut events = f.notifier.subscribe();

        let outcome = f.manager.sync_now().await;
        assert!(matches!(
            outcome,
            SyncOutcome::Failed { collection: CollectionKey::MadeEntries, ref synced, .. }
                if synced == &vec![CollectionKey::Recipes]
        ));
        assert!(f.recipes.get(&soup.id).unwrap().synced);
        assert!(!f.entries.get(&entry.id).unwrap().synced);

        // Only the recipes commit published, and only the failure was announced
        let event = events.try_recv().unwrap();
        assert_eq!(event.collection, CollectionKey::Recipes);
        assert_eq!(event.origin, ChangeOrigin::Sync);
        assert!(events.try_recv().is_err());

        assert_eq!(notices.try_recv().unwrap().level, NoticeLevel::Error);
        assert!(notices.try_recv().is_err());
        assert_eq!(f.manager.status(), SyncStatus::Pending { dirty: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_during_exchange_stays_dirty() {
        let f = fixture(true);
        let soup = f.recipes.add(recipe("Miso")).unwrap();

        let manager = f.manager.clone();
        let pass = tokio::spawn(async move { manager.sync_now().await });
        tokio::task::yield_now().await;

        // Lands while the exchange is in flight
        f.recipes.update(&soup.id, recipe("Red Miso")).unwrap();
        pass.await.unwrap();

        let current = f.recipes.get(&soup.id).unwrap();
        assert_eq!(current.title, "Red Miso");
        assert!(!current.synced);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_syncs_on_interval() {
        let f = fixture(true);
        let handle = f.manager.start();

        // Startup pass finds nothing
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(f.remote.exchanges(), 0);

        f.recipes.add(recipe("Miso")).unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(f.manager.dirty_count(), 0);
        assert_eq!(f.remote.exchanges(), 1);

        drop(handle);
        f.recipes.add(recipe("Pho")).unwrap();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(f.manager.dirty_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_syncs_on_reconnect() {
        let f = fixture(false);
        let _handle = f.manager.start();
        f.recipes.add(recipe("Miso")).unwrap();

        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(f.manager.dirty_count(), 1);

        f.manager.connectivity().set_online(true);
        // Well before the next interval tick
        tokio::time::sleep(LATENCY + Duration::from_millis(10)).await;
        assert_eq!(f.manager.dirty_count(), 0);
    }
}
