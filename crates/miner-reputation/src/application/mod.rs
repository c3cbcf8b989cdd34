//! # Application Layer
//!
//! Round execution and the manager that owns it.

pub mod calculator;
pub mod diagnostics;
pub mod manager;
pub mod pool;
mod refresh;
pub mod scope;
pub mod store;

pub use calculator::ReputationCalculator;
pub use diagnostics::TracingDiagnostics;
pub use manager::ReputationManager;
pub use pool::{CalculationResult, WorkerPool};
pub use scope::RoundScope;
pub use store::SnapshotStore;
