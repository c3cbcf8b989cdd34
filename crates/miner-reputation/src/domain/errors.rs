//! # Domain Errors
//!
//! Error types for the reputation monitor.
//!
//! Per-participant errors never leave the refresh loop: they only decide
//! whether a participant appears in the next snapshot.

use std::fmt;
use thiserror::Error;

use super::value_objects::Address;

/// Address parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Empty string.
    #[error("Empty address")]
    Empty,

    /// Network prefix is neither mainnet nor testnet.
    #[error("Unknown network prefix '{0}'")]
    UnknownNetwork(char),

    /// Protocol indicator missing or out of range.
    #[error("Invalid protocol indicator in address {0}")]
    InvalidProtocol(String),

    /// Nothing after the protocol indicator.
    #[error("Address {0} has no payload")]
    MissingPayload(String),

    /// Payload contains non-alphanumeric characters.
    #[error("Address {0} has an invalid payload")]
    InvalidPayload(String),
}

/// Errors reported by the chain gateway and participant directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The request did not complete in time.
    #[error("Request timed out")]
    Timeout,

    /// The requested actor or record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Connection or HTTP level failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Error message returned by the node
        message: String,
    },

    /// The node answered with something we could not decode.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Why an in-flight calculation was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The round timeout elapsed.
    Deadline,
    /// The manager is shutting down.
    Shutdown,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deadline => write!(f, "round deadline exceeded"),
            Self::Shutdown => write!(f, "shutdown requested"),
        }
    }
}

/// Reputation monitor error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReputationError {
    /// Peer identity could not be resolved. Retried next round.
    #[error("Peer identity lookup for {participant} failed: {cause}")]
    LookupFailed {
        /// Participant being calculated
        participant: Address,
        /// Underlying gateway failure
        cause: GatewayError,
    },

    /// The slashed-status state call failed in transit.
    #[error("Slashed status query for {participant} failed: {cause}")]
    QueryFailed {
        /// Participant being calculated
        participant: Address,
        /// Underlying gateway failure
        cause: GatewayError,
    },

    /// The state call completed but the actor returned a non-zero exit code.
    #[error("Slashed status query for {participant} rejected with exit code {code}")]
    RemoteRejected {
        /// Participant being calculated
        participant: Address,
        /// Actor exit code
        code: i64,
    },

    /// The participant directory could not be fetched. Aborts the round only.
    #[error("Participant directory unavailable: {0}")]
    DirectoryUnavailable(GatewayError),

    /// The calculation was cancelled before it completed.
    #[error("Calculation for {participant} cancelled: {reason}")]
    Cancelled {
        /// Participant being calculated
        participant: Address,
        /// Deadline or shutdown
        reason: CancelReason,
    },

    /// A worker task terminated abnormally.
    #[error("Worker task failed: {0}")]
    WorkerFailed(String),
}

impl ReputationError {
    /// Participant the error belongs to, if any.
    pub fn participant(&self) -> Option<&Address> {
        match self {
            Self::LookupFailed { participant, .. }
            | Self::QueryFailed { participant, .. }
            | Self::RemoteRejected { participant, .. }
            | Self::Cancelled { participant, .. } => Some(participant),
            Self::DirectoryUnavailable(_) | Self::WorkerFailed(_) => None,
        }
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LookupFailed { .. } => "lookup_failed",
            Self::QueryFailed { .. } => "query_failed",
            Self::RemoteRejected { .. } => "remote_rejected",
            Self::DirectoryUnavailable(_) => "directory_unavailable",
            Self::Cancelled { .. } => "cancelled",
            Self::WorkerFailed(_) => "worker_failed",
        }
    }

    /// Whether this is an internal cancellation signal rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_failed_error() {
        let err = ReputationError::LookupFailed {
            participant: Address::from_actor_id(1000),
            cause: GatewayError::NotFound("actor".to_string()),
        };
        assert!(err.to_string().contains("t01000"));
        assert!(err.to_string().contains("Not found"));
        assert_eq!(err.kind(), "lookup_failed");
    }

    #[test]
    fn test_remote_rejected_error() {
        let err = ReputationError::RemoteRejected {
            participant: Address::from_actor_id(1001),
            code: 16,
        };
        assert!(err.to_string().contains("exit code 16"));
        assert_eq!(err.participant(), Some(&Address::from_actor_id(1001)));
    }

    #[test]
    fn test_directory_unavailable_has_no_participant() {
        let err = ReputationError::DirectoryUnavailable(GatewayError::Timeout);
        assert!(err.participant().is_none());
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_cancelled_error() {
        let err = ReputationError::Cancelled {
            participant: Address::from_actor_id(1002),
            reason: CancelReason::Deadline,
        };
        assert!(err.is_cancelled());
        assert!(err.to_string().contains("deadline"));
    }

    #[test]
    fn test_rpc_error_display() {
        let err = GatewayError::Rpc {
            code: -32601,
            message: "method not found".to_string(),
        };
        assert_eq!(err.to_string(), "RPC error -32601: method not found");
    }
}
