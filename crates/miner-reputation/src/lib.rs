//! # Miner Reputation
//!
//! Background reputation monitor for storage miners.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Periodically list every storage participant known to the chain, compute
//! a reputation record for each one and publish the results as a snapshot
//! that callers can read at any time without waiting on the network.
//!
//! ## Round Lifecycle
//!
//! | Phase | Work |
//! |-------|------|
//! | Idle | Wait one refresh interval |
//! | FetchingDirectory | `StateListMiners` equivalent via [`ParticipantDirectory`] |
//! | Calculating | Peer id lookup + `IsSlashed` call per participant, bounded pool |
//! | Publishing | Replace the snapshot wholesale |
//!
//! A failed participant is simply missing from the next snapshot. A failed
//! directory fetch leaves the previous snapshot in place.
//!
//! ## Module Structure
//!
//! ```text
//! miner-reputation/
//! ├── domain/          # Address, Reputation, Snapshot, errors, CBOR decoding
//! ├── ports/           # ReputationApi, ChainGateway, ParticipantDirectory, DiagnosticsSink
//! ├── application/     # Calculator, worker pool, refresh loop, ReputationManager
//! ├── adapters/        # Lotus JSON-RPC gateway (feature "lotus")
//! ├── testing.rs       # MockChainGateway, RecordingDiagnostics
//! └── config.rs        # MonitorConfig
//! ```
//!
//! ## Example
//!
//! ```ignore
//! let gateway = Arc::new(LotusGateway::new(LotusConfig::default())?);
//! let manager = ReputationManager::new(gateway);
//! // ...
//! for rep in manager.reputations() {
//!     println!("{} {} slashed={}", rep.address, rep.peer_id, rep.slashed);
//! }
//! manager.close().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "lotus")]
pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod testing;

// Re-exports
#[cfg(feature = "lotus")]
pub use adapters::{LotusConfig, LotusGateway};
pub use application::{
    ReputationCalculator, ReputationManager, RoundScope, SnapshotStore, TracingDiagnostics,
    WorkerPool,
};
pub use config::{ConfigError, EmptyRoundPolicy, MonitorConfig};
pub use domain::{
    Address, AddressError, CancelReason, GatewayError, LifecycleState, MethodNum, PeerId,
    RefreshPhase, Reputation, ReputationError, RoundReport, Snapshot, StateCallResult,
    StateQuery, TipSetKey, IS_SLASHED_METHOD,
};
pub use ports::{ChainGateway, DiagnosticsSink, MonitorEvent, ParticipantDirectory, ReputationApi};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
