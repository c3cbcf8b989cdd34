//! # Outbound Ports
//!
//! Traits for the services the monitor depends on: the chain gateway, the
//! participant directory and the diagnostics sink.
//!
//! Gateway futures are cancelled by dropping them; implementations must not
//! rely on running to completion.

use async_trait::async_trait;

use crate::domain::{
    Address, GatewayError, MethodNum, PeerId, ReputationError, RoundReport, StateCallResult,
    StateQuery, TipSetKey, IS_SLASHED_METHOD,
};

/// Chain gateway - outbound port.
///
/// # Thread Safety
///
/// Calls are issued concurrently from worker tasks, so implementations must
/// be `Send + Sync` and re-entrant.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Resolve the libp2p identity advertised by a participant.
    async fn resolve_peer_identity(&self, participant: &Address) -> Result<PeerId, GatewayError>;

    /// Execute a read-only state call.
    async fn query_state(&self, query: &StateQuery) -> Result<StateCallResult, GatewayError>;

    /// Method number answering the slashed-status query.
    fn slashed_method(&self) -> MethodNum {
        IS_SLASHED_METHOD
    }
}

/// Participant directory - outbound port.
#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    /// List every known participant.
    ///
    /// `tipset` selects the chain state to read; `None` means the head.
    async fn list_participants(
        &self,
        tipset: Option<&TipSetKey>,
    ) -> Result<Vec<Address>, GatewayError>;
}

/// Diagnostics emitted by the refresh loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MonitorEvent {
    /// A timer tick started a round.
    RoundStarted {
        /// Round number
        round: u64,
    },
    /// The directory fetch failed; the previous snapshot stays published.
    DirectoryUnavailable {
        /// Round number
        round: u64,
        /// Always `ReputationError::DirectoryUnavailable`
        error: ReputationError,
    },
    /// One participant produced no record this round.
    ParticipantFailed {
        /// Round number
        round: u64,
        /// Per-participant failure
        error: ReputationError,
    },
    /// The round's records replaced the snapshot.
    SnapshotPublished {
        /// Round summary
        report: RoundReport,
    },
    /// Every participant failed and the previous snapshot was kept.
    SnapshotPreserved {
        /// Round summary
        report: RoundReport,
    },
    /// Shutdown interrupted the round; nothing was published.
    RoundAbandoned {
        /// Round number
        round: u64,
    },
    /// The refresh loop exited.
    LoopStopped {
        /// Rounds started before exit
        rounds: u64,
    },
}

/// Diagnostics sink - outbound port.
///
/// Injected at construction so the core carries no global logger.
pub trait DiagnosticsSink: Send + Sync {
    /// Record one event. Must not block.
    fn record(&self, event: &MonitorEvent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GatewayError;

    struct CountingSink(std::sync::atomic::AtomicUsize);

    impl DiagnosticsSink for CountingSink {
        fn record(&self, _event: &MonitorEvent) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[test]
    fn test_sink_is_object_safe() {
        let sink: Box<dyn DiagnosticsSink> =
            Box::new(CountingSink(std::sync::atomic::AtomicUsize::new(0)));
        sink.record(&MonitorEvent::RoundStarted { round: 1 });
        sink.record(&MonitorEvent::DirectoryUnavailable {
            round: 1,
            error: ReputationError::DirectoryUnavailable(GatewayError::Timeout),
        });
    }
}
