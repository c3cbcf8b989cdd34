//! # Test Doubles
//!
//! In-memory chain gateway and a recording diagnostics sink, for tests of
//! this crate and of crates embedding the monitor.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::domain::{
    Address, GatewayError, MethodNum, PeerId, RoundReport, StateCallResult, StateQuery,
    TipSetKey, CBOR_FALSE, CBOR_TRUE,
};
use crate::ports::{ChainGateway, DiagnosticsSink, MonitorEvent, ParticipantDirectory};

/// How a mock participant answers the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticipantBehaviour {
    /// Both calls succeed.
    Healthy {
        /// Slashed status returned by the state call.
        slashed: bool,
    },
    /// Peer identity lookup fails.
    LookupFails,
    /// State call fails in transit.
    QueryFails,
    /// State call completes with the given non-zero exit code.
    Rejects(i64),
    /// Peer identity resolves but the state call never completes.
    Hangs,
}

/// Mock chain gateway and participant directory.
pub struct MockChainGateway {
    participants: Mutex<Vec<(Address, ParticipantBehaviour)>>,
    latency: Duration,
    directory_failures: AtomicUsize,
    directory_hangs: AtomicBool,
    directory_calls: AtomicU64,
    state_calls: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    last_method: Mutex<Option<MethodNum>>,
}

impl Default for MockChainGateway {
    fn default() -> Self {
        Self {
            participants: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
            directory_failures: AtomicUsize::new(0),
            directory_hangs: AtomicBool::new(false),
            directory_calls: AtomicU64::new(0),
            state_calls: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            last_method: Mutex::new(None),
        }
    }
}

impl MockChainGateway {
    /// Gateway with an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a participant to the directory.
    pub fn with_participant(self, address: Address, behaviour: ParticipantBehaviour) -> Self {
        self.participants.lock().push((address, behaviour));
        self
    }

    /// Delay every gateway call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make the directory fetch never complete.
    pub fn with_hanging_directory(self) -> Self {
        self.directory_hangs.store(true, Ordering::SeqCst);
        self
    }

    /// Peer identity the mock reports for `address`.
    pub fn peer_id_for(address: &Address) -> PeerId {
        PeerId::new(format!("12D3KooW{address}"))
    }

    /// Add a participant after construction.
    pub fn add_participant(&self, address: Address, behaviour: ParticipantBehaviour) {
        self.participants.lock().push((address, behaviour));
    }

    /// Remove a participant from the directory.
    pub fn remove_participant(&self, address: &Address) {
        self.participants.lock().retain(|(a, _)| a != address);
    }

    /// Change the behaviour of every entry for `address`.
    pub fn set_behaviour(&self, address: &Address, behaviour: ParticipantBehaviour) {
        for (a, b) in self.participants.lock().iter_mut() {
            if a == address {
                *b = behaviour;
            }
        }
    }

    /// Fail the next `count` directory fetches.
    pub fn fail_directory(&self, count: usize) {
        self.directory_failures.store(count, Ordering::SeqCst);
    }

    /// Directory fetches served so far.
    pub fn directory_calls(&self) -> u64 {
        self.directory_calls.load(Ordering::SeqCst)
    }

    /// State calls served so far.
    pub fn state_calls(&self) -> u64 {
        self.state_calls.load(Ordering::SeqCst)
    }

    /// Highest number of gateway calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Method number of the most recent state call.
    pub fn last_method(&self) -> Option<MethodNum> {
        *self.last_method.lock()
    }

    fn behaviour(&self, address: &Address) -> Option<ParticipantBehaviour> {
        self.participants
            .lock()
            .iter()
            .find(|(a, _)| a == address)
            .map(|(_, b)| *b)
    }

    async fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        guard
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChainGateway for MockChainGateway {
    async fn resolve_peer_identity(&self, participant: &Address) -> Result<PeerId, GatewayError> {
        let _guard = self.enter().await;
        match self.behaviour(participant) {
            None => Err(GatewayError::NotFound(participant.to_string())),
            Some(ParticipantBehaviour::LookupFails) => {
                Err(GatewayError::NotFound(format!("peer id of {participant}")))
            }
            Some(_) => Ok(Self::peer_id_for(participant)),
        }
    }

    async fn query_state(&self, query: &StateQuery) -> Result<StateCallResult, GatewayError> {
        let _guard = self.enter().await;
        self.state_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_method.lock() = Some(query.method);

        match self.behaviour(&query.to) {
            None => Err(GatewayError::NotFound(query.to.to_string())),
            Some(ParticipantBehaviour::Healthy { slashed }) => {
                let data = if slashed { CBOR_TRUE } else { CBOR_FALSE };
                Ok(StateCallResult::ok(data.to_vec()))
            }
            Some(ParticipantBehaviour::QueryFails) => {
                Err(GatewayError::Transport("connection reset".to_string()))
            }
            Some(ParticipantBehaviour::Rejects(code)) => Ok(StateCallResult::rejected(code)),
            Some(ParticipantBehaviour::LookupFails) => Ok(StateCallResult::ok(CBOR_FALSE.to_vec())),
            Some(ParticipantBehaviour::Hangs) => std::future::pending().await,
        }
    }
}

#[async_trait]
impl ParticipantDirectory for MockChainGateway {
    async fn list_participants(
        &self,
        _tipset: Option<&TipSetKey>,
    ) -> Result<Vec<Address>, GatewayError> {
        self.directory_calls.fetch_add(1, Ordering::SeqCst);

        if self.directory_hangs.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let failing = self
            .directory_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(GatewayError::Transport("directory unreachable".to_string()));
        }

        Ok(self
            .participants
            .lock()
            .iter()
            .map(|(a, _)| a.clone())
            .collect())
    }
}

/// Diagnostics sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<MonitorEvent>>,
}

impl RecordingDiagnostics {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events recorded so far.
    pub fn events(&self) -> Vec<MonitorEvent> {
        self.events.lock().clone()
    }

    /// Report of the most recent published snapshot.
    pub fn last_published(&self) -> Option<RoundReport> {
        self.events.lock().iter().rev().find_map(|e| match e {
            MonitorEvent::SnapshotPublished { report } => Some(report.clone()),
            _ => None,
        })
    }

    /// Number of events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&MonitorEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }
}

impl DiagnosticsSink for RecordingDiagnostics {
    fn record(&self, event: &MonitorEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_directory_failure_countdown() {
        let gateway = MockChainGateway::new().with_participant(
            Address::from_actor_id(1),
            ParticipantBehaviour::Healthy { slashed: false },
        );
        gateway.fail_directory(2);

        assert!(gateway.list_participants(None).await.is_err());
        assert!(gateway.list_participants(None).await.is_err());
        assert_eq!(gateway.list_participants(None).await.unwrap().len(), 1);
        assert_eq!(gateway.directory_calls(), 3);
    }

    #[tokio::test]
    async fn test_mock_unknown_participant() {
        let gateway = MockChainGateway::new();
        let err = gateway
            .resolve_peer_identity(&Address::from_actor_id(9))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[test]
    fn test_recording_diagnostics() {
        let sink = RecordingDiagnostics::new();
        sink.record(&MonitorEvent::RoundStarted { round: 1 });
        sink.record(&MonitorEvent::SnapshotPublished {
            report: RoundReport {
                round: 1,
                ..Default::default()
            },
        });

        assert_eq!(sink.events().len(), 2);
        assert_eq!(sink.last_published().unwrap().round, 1);
        assert_eq!(
            sink.count(|e| matches!(e, MonitorEvent::RoundStarted { .. })),
            1
        );
    }
}
