//! # Change notifier — the "something was written" bus
//!
//! Every committed write to a collection publishes one [`ChangeEvent`] on the
//! [`ChangeNotifier`]. The notifier is a cloneable handle over a
//! `tokio::sync::broadcast` channel; it is created once per application
//! context and handed to every repository and to the sync manager.
//!
//! The event names the collection that moved, but subscribers are free to
//! treat it as a global signal and simply re-read whatever they display.
//! That is what [`crate::view::LiveView`] does.
//!
//! Contexts that do not share a notifier (another process over the same
//! [`crate::FileStore`], another browser window) are only reached by the
//! live views' poll fallback.

use tokio::sync::broadcast;

use crate::models::CollectionKey;

const CHANNEL_CAPACITY: usize = 64;

/// Who committed the write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// A repository mutation (add, update, delete, seed).
    Local,
    /// The sync manager flipping records to synced.
    Sync,
}

/// One committed write to one collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: CollectionKey,
    pub origin: ChangeOrigin,
}

/// Broadcast handle shared by every writer and reader of one context.
#[derive(Clone, Debug)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish a change. Having no subscribers is not an error.
    pub fn notify(&self, collection: CollectionKey, origin: ChangeOrigin) {
        let delivered = self
            .tx
            .send(ChangeEvent { collection, origin })
            .unwrap_or(0);
        tracing::trace!(%collection, ?origin, delivered, "change published");
    }

    /// Receive every change published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}
