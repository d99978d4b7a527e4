//! Online/offline status as a single reactive boolean.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Tracks whether the platform currently reports connectivity.
///
/// Clones share the same state. The platform layer calls [`set_online`] from
/// its online/offline events; readers either ask [`is_online`] or
/// [`subscribe`] to transitions.
///
/// [`set_online`]: ConnectivityMonitor::set_online
/// [`is_online`]: ConnectivityMonitor::is_online
/// [`subscribe`]: ConnectivityMonitor::subscribe
#[derive(Clone, Debug)]
pub struct ConnectivityMonitor {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    /// `initially_online` is the platform state at construction.
    pub fn new(initially_online: bool) -> Self {
        let (tx, _) = watch::channel(initially_online);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Record the platform signal. Returns `true` when this was a transition.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
        if changed {
            tracing::info!(online, "connectivity changed");
        }
        changed
    }

    /// Receiver woken on every transition.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Poll `probe` every `interval` and feed the result into this monitor.
    ///
    /// For platforms whose online/offline events are unreliable. The probe
    /// stops when the returned handle is dropped.
    pub fn spawn_heartbeat<P: Probe + 'static>(&self, probe: P, interval: Duration) -> Heartbeat {
        let monitor = self.clone();
        let task = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                timer.tick().await;
                let reachable = probe.check().await;
                monitor.set_online(reachable);
            }
        });
        Heartbeat { task }
    }
}

/// A reachability check, e.g. a cheap request against the backend.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn check(&self) -> bool;
}

/// Running heartbeat; aborted on drop.
pub struct Heartbeat {
    task: JoinHandle<()>,
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_initial_state() {
        assert!(ConnectivityMonitor::new(true).is_online());
        assert!(!ConnectivityMonitor::new(false).is_online());
    }

    #[tokio::test]
    async fn test_only_transitions_wake_subscribers() {
        let monitor = ConnectivityMonitor::new(false);
        let mut rx = monitor.subscribe();

        // Same value again is not a transition
        assert!(!monitor.set_online(false));
        assert!(!rx.has_changed().unwrap());

        assert!(monitor.set_online(true));
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
        assert!(monitor.clone().is_online());
    }

    struct Flag(Arc<AtomicBool>);

    #[async_trait]
    impl Probe for Flag {
        async fn check(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_feeds_monitor() {
        let monitor = ConnectivityMonitor::new(true);
        let reachable = Arc::new(AtomicBool::new(false));
        let heartbeat = monitor.spawn_heartbeat(Flag(reachable.clone()), Duration::from_secs(30));
        let mut rx = monitor.subscribe();

        // First probe runs immediately
        rx.changed().await.unwrap();
        assert!(!monitor.is_online());

        reachable.store(true, Ordering::SeqCst);
        tokio::time::advance(Duration::from_secs(30)).await;
        rx.changed().await.unwrap();
        assert!(monitor.is_online());

        drop(heartbeat);
        reachable.store(false, Ordering::SeqCst);
        tokio::time::advance(Duration::from_secs(60)).await;
        tokio::task::yield_now().await;
        assert!(monitor.is_online());
    }
}
