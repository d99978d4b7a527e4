//! Background reconciliation of locally-stored collections.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`connectivity`] | [`ConnectivityMonitor`], the online/offline signal, plus an optional probe heartbeat. |
//! | [`remote`] | The [`Remote`] exchange trait and the fixed-latency [`SimulatedRemote`]. |
//! | [`target`] | [`SyncTarget`], implemented for every `store::Collection`. |
//! | [`manager`] | [`SyncManager`]: guarded passes, reconnect and timer triggers. |
//! | [`notice`] | User-facing notices and the sync indicator state. |

pub mod connectivity;
pub mod manager;
pub mod notice;
pub mod remote;
pub mod target;

pub use connectivity::{ConnectivityMonitor, Heartbeat, Probe};
pub use manager::{SyncHandle, SyncManager, SyncOutcome};
pub use notice::{NoticeLevel, SyncNotice, SyncStatus};
pub use remote::{Remote, RemoteError, SimulatedRemote};
pub use target::{Reconciled, SyncError, SyncTarget};
