//! # Snapshot Store
//!
//! Holds the latest published snapshot. Publication swaps an `Arc` under a
//! short lock; readers clone the `Arc` and copy outside the lock, so a slow
//! reader never holds up the refresh loop.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

use crate::domain::{Reputation, Snapshot};

/// Latest-snapshot cell with round notifications.
pub struct SnapshotStore {
    current: Mutex<Option<Arc<Snapshot>>>,
    published: watch::Sender<u64>,
}

impl SnapshotStore {
    /// Empty store. Readers see no records until the first publish.
    pub fn new() -> Self {
        let (published, _) = watch::channel(0);
        Self {
            current: Mutex::new(None),
            published,
        }
    }

    /// Replace the snapshot wholesale and notify subscribers.
    pub fn publish(&self, snapshot: Snapshot) {
        let round = snapshot.round;
        *self.current.lock() = Some(Arc::new(snapshot));
        self.published.send_replace(round);
    }

    /// Owned copy of the latest snapshot.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.latest().map(|s| (*s).clone())
    }

    /// Owned copy of the latest records. Empty before the first publish.
    pub fn reputations(&self) -> Vec<Reputation> {
        self.latest()
            .map(|s| s.records.clone())
            .unwrap_or_default()
    }

    /// Round number of the latest snapshot, zero if none.
    pub fn latest_round(&self) -> u64 {
        *self.published.borrow()
    }

    /// Receiver notified with the round number of every publish.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.published.subscribe()
    }

    fn latest(&self) -> Option<Arc<Snapshot>> {
        self.current.lock().clone()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, PeerId};

    fn record(id: u64) -> Reputation {
        Reputation::new(Address::from_actor_id(id), PeerId::new(format!("peer-{id}")), false)
    }

    #[test]
    fn test_empty_before_first_publish() {
        let store = SnapshotStore::new();
        assert!(store.reputations().is_empty());
        assert!(store.snapshot().is_none());
        assert_eq!(store.latest_round(), 0);
    }

    #[test]
    fn test_publish_replaces_wholesale() {
        let store = SnapshotStore::new();
        store.publish(Snapshot::new(1, vec![record(1), record(2)]));
        store.publish(Snapshot::new(2, vec![record(3)]));

        let records = store.reputations();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].address, Address::from_actor_id(3));
        assert_eq!(store.latest_round(), 2);
    }

    #[test]
    fn test_returned_copy_is_isolated() {
        let store = SnapshotStore::new();
        store.publish(Snapshot::new(1, vec![record(1)]));

        let mut copy = store.reputations();
        copy[0].slashed = true;
        copy.clear();

        let fresh = store.reputations();
        assert_eq!(fresh.len(), 1);
        assert!(!fresh[0].slashed);
    }

    #[tokio::test]
    async fn test_subscribers_see_new_rounds() {
        let store = SnapshotStore::new();
        let mut rx = store.subscribe();

        store.publish(Snapshot::new(7, Vec::new()));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 7);
    }
}
