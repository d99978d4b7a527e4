//! Collections the sync manager reconciles.

use async_trait::async_trait;
use store::{Collection, CollectionKey, Record, StoreError};
use thiserror::Error;

use crate::remote::{Remote, RemoteError};

/// Why reconciling one collection failed.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to encode collection: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result of reconciling one collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciled {
    /// Nothing was dirty; the remote was not contacted.
    Clean,
    /// The exchange succeeded and `records` records were flipped to synced.
    Synced { records: usize },
}

/// A collection with a dirty flag per record.
#[async_trait]
pub trait SyncTarget: Send + Sync {
    fn collection(&self) -> CollectionKey;

    fn dirty_count(&self) -> usize;

    /// Exchange the collection with `remote` if anything is dirty.
    async fn reconcile(&self, remote: &dyn Remote) -> Result<Reconciled, SyncError>;
}

#[async_trait]
impl<T: Record> SyncTarget for Collection<T> {
    fn collection(&self) -> CollectionKey {
        T::COLLECTION
    }

    fn dirty_count(&self) -> usize {
        Collection::dirty_count(self)
    }

    async fn reconcile(&self, remote: &dyn Remote) -> Result<Reconciled, SyncError> {
        let snapshot = self.list();
        let dirty = snapshot.iter().filter(|r| !r.is_synced()).count();
        if dirty == 0 {
            return Ok(Reconciled::Clean);
        }

        let payload = serde_json::to_value(&snapshot)?;
        remote.reconcile(T::COLLECTION, &payload).await?;

        let records = self.mark_synced_if_unchanged(&snapshot)?;
        if records < dirty {
            let collection = T::COLLECTION;
            tracing::debug!(
                %collection,
                left_dirty = dirty - records,
                "records changed during exchange stay dirty"
            );
        }
        Ok(Reconciled::Synced { records })
    }
}
