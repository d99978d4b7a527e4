//! # Live views — snapshots that follow the store
//!
//! A [`LiveView`] is what a screen subscribes to: the latest decoded snapshot
//! of one collection, kept current by a background task.
//!
//! ## Refresh triggers
//!
//! | Trigger | Source | Reaches |
//! |---------|--------|---------|
//! | Broadcast | [`ChangeNotifier`] event | every view in the same context |
//! | Poll | timer, every `poll_interval` | views in contexts the broadcast does not reach |
//!
//! Both triggers re-read the slot. The snapshot is only replaced (and
//! watchers woken) when the stored value's [`Digest`] differs from the last
//! decoded one, so a quiet poll costs one read and one hash.
//!
//! Convergence is eventual: within one broadcast, or one poll interval for
//! isolated contexts.
//!
//! ## Lifetime
//!
//! The task is owned by the view. Dropping the view aborts it; nothing keeps
//! polling after its screen is gone. The task needs a Tokio runtime.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::digest::Digest;
use crate::kv::{decode_collection, KeyValueStore};
use crate::models::Record;
use crate::notify::ChangeNotifier;

/// A self-refreshing snapshot of one collection.
pub struct LiveView<T: Record> {
    snapshot: watch::Receiver<Vec<T>>,
    task: JoinHandle<()>,
}

struct Reader<T> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    last: Digest,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Reader<T> {
    fn new(store: Arc<dyn KeyValueStore>) -> (Self, Vec<T>) {
        let key = T::COLLECTION.storage_key();
        let raw = store.read(key);
        let last = Digest::of_slot(raw.as_deref());
        let items = raw
            .map(|raw| decode_collection(key, &raw))
            .unwrap_or_default();
        let reader = Self {
            store,
            key,
            last,
            _record: PhantomData,
        };
        (reader, items)
    }

    /// Re-read the slot; `Some` when it changed since the last decode.
    fn poll(&mut self) -> Option<Vec<T>> {
        let raw = self.store.read(self.key);
        let digest = Digest::of_slot(raw.as_deref());
        if digest == self.last {
            return None;
        }
        self.last = digest;
        Some(
            raw.map(|raw| decode_collection(self.key, &raw))
                .unwrap_or_default(),
        )
    }
}

impl<T: Record> LiveView<T> {
    /// Start following the collection of `T` in `store`.
    ///
    /// `poll_interval` of `None` disables the poll fallback.
    pub fn spawn(
        store: Arc<dyn KeyValueStore>,
        notifier: &ChangeNotifier,
        poll_interval: Option<Duration>,
    ) -> Self {
        let (mut reader, initial) = Reader::<T>::new(store);
        let (tx, snapshot) = watch::channel(initial);
        let mut events = notifier.subscribe();

        let task = tokio::spawn(async move {
            let mut poll = poll_interval.map(|period| {
                let start = tokio::time::Instant::now() + period;
                let mut timer = tokio::time::interval_at(start, period);
                timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
                timer
            });
            let mut listening = true;

            loop {
                tokio::select! {
                    event = events.recv(), if listening => match event {
                        Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => {
                            listening = false;
                            if poll.is_none() {
                                return;
                            }
                            continue;
                        }
                    },
                    _ = tick(&mut poll) => {}
                }

                if let Some(items) = reader.poll() {
                    tracing::debug!(key = reader.key, records = items.len(), "view refreshed");
                    if tx.send(items).is_err() {
                        return;
                    }
                }
            }
        });

        Self { snapshot, task }
    }

    /// The latest snapshot.
    pub fn current(&self) -> Vec<T> {
        self.snapshot.borrow().clone()
    }

    /// Wait for the next snapshot. Returns `false` once the view has stopped.
    pub async fn changed(&mut self) -> bool {
        self.snapshot.changed().await.is_ok()
    }

    /// Independent receiver for callers that want to await snapshots themselves.
    pub fn subscribe(&self) -> watch::Receiver<Vec<T>> {
        self.snapshot.clone()
    }
}

async fn tick(poll: &mut Option<tokio::time::Interval>) {
    match poll {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

impl<T: Record> Drop for LiveView<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
