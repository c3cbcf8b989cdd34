//! # Domain Entities
//!
//! Reputation records, published snapshots and the lifecycle states of the
//! refresh machinery.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds, TimestampMilliSeconds};
use std::fmt;
use std::time::{Duration, SystemTime};

use super::value_objects::{Address, PeerId};

/// Reputation of a single participant, as observed in one round.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reputation {
    /// Participant address.
    pub address: Address,
    /// Resolved libp2p identity.
    pub peer_id: PeerId,
    /// Whether the on-chain state reports the participant as slashed.
    pub slashed: bool,
    /// Average request latency. Zero when not measured.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "avg_latency_ms")]
    pub avg_latency: Duration,
    /// Geolocation of the participant, when known.
    pub country: Option<String>,
}

impl Reputation {
    /// Record with the best-effort fields left empty.
    pub fn new(address: Address, peer_id: PeerId, slashed: bool) -> Self {
        Self {
            address,
            peer_id,
            slashed,
            avg_latency: Duration::ZERO,
            country: None,
        }
    }
}

/// Records produced by one completed round.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Round number that produced this snapshot.
    pub round: u64,
    /// When the snapshot was published.
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub published_at: SystemTime,
    /// Successful records of the round, in completion order.
    pub records: Vec<Reputation>,
}

impl Snapshot {
    /// Snapshot for `round`, stamped now.
    pub fn new(round: u64, records: Vec<Reputation>) -> Self {
        Self {
            round,
            published_at: SystemTime::now(),
            records,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the round produced no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of slashed participants.
    pub fn slashed_count(&self) -> usize {
        self.records.iter().filter(|r| r.slashed).count()
    }

    /// Look up a participant's record.
    pub fn get(&self, address: &Address) -> Option<&Reputation> {
        self.records.iter().find(|r| &r.address == address)
    }
}

/// Summary of one round, reported to diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundReport {
    /// Round number.
    pub round: u64,
    /// Participants returned by the directory.
    pub participants: usize,
    /// Records produced.
    pub succeeded: usize,
    /// Participants that failed (cancellations excluded).
    pub failed: usize,
    /// Participants cancelled by the round deadline.
    pub cancelled: usize,
    /// Slashed participants among the records.
    pub slashed: usize,
    /// Wall time of the round.
    pub elapsed: Duration,
}

impl RoundReport {
    /// Every listed participant failed or was cancelled.
    pub fn is_total_failure(&self) -> bool {
        self.participants > 0 && self.succeeded == 0
    }
}

/// Manager lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Refresh loop is active.
    Running,
    /// Shutdown requested, waiting for the loop to exit.
    Stopping,
    /// Loop has exited.
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Refresh loop phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPhase {
    /// Waiting for the next tick.
    Idle,
    /// Listing participants.
    FetchingDirectory,
    /// Worker pool is running.
    Calculating,
    /// Replacing the snapshot.
    Publishing,
    /// Loop has exited.
    Stopped,
}

impl fmt::Display for RefreshPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::FetchingDirectory => write!(f, "fetching_directory"),
            Self::Calculating => write!(f, "calculating"),
            Self::Publishing => write!(f, "publishing"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, slashed: bool) -> Reputation {
        Reputation::new(
            Address::from_actor_id(id),
            PeerId::new(format!("12D3KooW{id}")),
            slashed,
        )
    }

    #[test]
    fn test_reputation_defaults_best_effort_fields() {
        let rep = record(1000, false);
        assert_eq!(rep.avg_latency, Duration::ZERO);
        assert!(rep.country.is_none());
    }

    #[test]
    fn test_snapshot_queries() {
        let snapshot = Snapshot::new(3, vec![record(1, false), record(2, true)]);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.slashed_count(), 1);
        assert!(snapshot.get(&Address::from_actor_id(2)).unwrap().slashed);
        assert!(snapshot.get(&Address::from_actor_id(9)).is_none());
    }

    #[test]
    fn test_round_report_total_failure() {
        let mut report = RoundReport {
            participants: 3,
            ..Default::default()
        };
        assert!(report.is_total_failure());

        report.succeeded = 1;
        assert!(!report.is_total_failure());

        // An empty directory is not a failure.
        let empty = RoundReport::default();
        assert!(!empty.is_total_failure());
    }

    #[test]
    fn test_reputation_json_shape() {
        let json = serde_json::to_value(record(1000, true)).unwrap();
        assert_eq!(json["address"], "t01000");
        assert_eq!(json["slashed"], true);
        assert_eq!(json["avg_latency_ms"], 0);
    }
}
