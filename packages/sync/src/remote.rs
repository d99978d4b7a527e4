//! # Remote exchange
//!
//! The [`Remote`] trait is the only place the sync manager talks to "the
//! server". A pass hands it the full collection and waits for an answer; on
//! `Ok` the exchanged records are marked synced, on `Err` nothing is.
//!
//! There is no backend yet. [`SimulatedRemote`] stands in for one: it waits a
//! fixed latency and succeeds, unless it was told to fail (every exchange,
//! as an outage) or to reject one collection. A real client
//! replaces it behind the same trait without touching the manager.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use store::CollectionKey;
use thiserror::Error;

/// Why an exchange did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("remote unreachable: {0}")]
    Unreachable(String),

    #[error("remote rejected {collection}: {reason}")]
    Rejected {
        collection: CollectionKey,
        reason: String,
    },
}

/// The remote side of a reconciliation.
#[async_trait]
pub trait Remote: Send + Sync {
    /// Send the whole `collection` (a JSON array of records).
    async fn reconcile(
        &self,
        collection: CollectionKey,
        records: &serde_json::Value,
    ) -> Result<(), RemoteError>;
}

/// Fixed-latency stand-in for a backend.
#[derive(Clone, Debug)]
pub struct SimulatedRemote {
    latency: Duration,
    failing: Arc<AtomicBool>,
    rejecting: Arc<Mutex<Option<CollectionKey>>>,
    exchanges: Arc<AtomicUsize>,
}

impl SimulatedRemote {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            failing: Arc::new(AtomicBool::new(false)),
            rejecting: Arc::new(Mutex::new(None)),
            exchanges: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every following exchange fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Reject every following exchange of `collection`; `None` accepts all again.
    pub fn set_rejecting(&self, collection: Option<CollectionKey>) {
        *self.rejecting.lock().unwrap_or_else(|e| e.into_inner()) = collection;
    }

    fn rejects(&self, collection: CollectionKey) -> bool {
        *self.rejecting.lock().unwrap_or_else(|e| e.into_inner()) == Some(collection)
    }

    /// Number of exchanges attempted so far.
    pub fn exchanges(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Remote for SimulatedRemote {
    async fn reconcile(
        &self,
        collection: CollectionKey,
        records: &serde_json::Value,
    ) -> Result<(), RemoteError> {
        let count = records.as_array().map_or(0, Vec::len);
        tracing::debug!(%collection, records = count, "simulated exchange started");
        tokio::time::sleep(self.latency).await;
        self.exchanges.fetch_add(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(RemoteError::Unreachable("simulated outage".to_string()));
        }
        if self.rejects(collection) {
            return Err(RemoteError::Rejected {
                collection,
                reason: "simulated rejection".to_string(),
            });
        }
        Ok(())
    }
}
