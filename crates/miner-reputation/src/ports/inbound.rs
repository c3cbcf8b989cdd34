//! # Inbound Ports
//!
//! Read API offered to the presentation layer.

use async_trait::async_trait;

use crate::domain::{LifecycleState, RefreshPhase, Reputation, Snapshot};

/// Reputation API - inbound port.
///
/// Every read returns an owned copy; nothing handed out aliases the
/// manager's storage.
#[async_trait]
pub trait ReputationApi: Send + Sync {
    /// Records of the latest published round. Empty before the first round.
    fn reputations(&self) -> Vec<Reputation>;

    /// Latest snapshot with its round metadata.
    fn snapshot(&self) -> Option<Snapshot>;

    /// Manager lifecycle state.
    fn state(&self) -> LifecycleState;

    /// Current refresh loop phase.
    fn phase(&self) -> RefreshPhase;

    /// Stop the refresh loop and wait for it to exit. Idempotent.
    async fn close(&self);
}
