//! Toast-style notices and the sync indicator state.

use chrono::{DateTime, Utc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient, non-blocking message for the user.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncNotice {
    pub at: DateTime<Utc>,
    pub level: NoticeLevel,
    pub message: String,
}

impl SyncNotice {
    pub fn new(level: NoticeLevel, message: &str) -> Self {
        Self {
            at: Utc::now(),
            level,
            message: message.to_string(),
        }
    }

    pub fn synced() -> Self {
        Self::new(NoticeLevel::Success, "All changes synced!")
    }

    pub fn failed() -> Self {
        Self::new(NoticeLevel::Error, "Sync failed. Will retry when online.")
    }
}

/// What a sync indicator shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    /// No connectivity; changes are kept locally.
    Offline,
    /// Online with dirty records waiting for the next pass.
    Pending { dirty: usize },
    /// Online and nothing to reconcile; the indicator hides.
    UpToDate,
}

impl SyncStatus {
    pub fn from_state(online: bool, dirty: usize) -> Self {
        match (online, dirty) {
            (false, _) => SyncStatus::Offline,
            (true, 0) => SyncStatus::UpToDate,
            (true, dirty) => SyncStatus::Pending { dirty },
        }
    }

    /// Indicator text, `None` when it should be hidden.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            SyncStatus::Offline => Some("Offline Mode"),
            SyncStatus::Pending { .. } => Some("Syncing..."),
            SyncStatus::UpToDate => None,
        }
    }
}
