//! # Worker Pool
//!
//! Runs one calculation per participant with at most `limit` in flight.
//!
//! Every participant gets its own task; a counting semaphore gates entry to
//! the gateway. Results are returned in completion order.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::trace;

use super::calculator::ReputationCalculator;
use super::scope::RoundScope;
use crate::domain::{Address, Reputation, ReputationError};
use crate::ports::ChainGateway;

/// Outcome of one participant's calculation.
pub type CalculationResult = Result<Reputation, ReputationError>;

/// Bounded-concurrency executor for a round's calculations.
#[derive(Clone, Copy, Debug)]
pub struct WorkerPool {
    limit: usize,
}

impl WorkerPool {
    /// Pool admitting `limit` concurrent calculations. A zero limit is
    /// raised to one.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    /// Maximum concurrent calculations.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Calculate every participant within `scope`.
    ///
    /// Returns exactly one result per participant. Participants still
    /// waiting for a permit or a gateway reply when the scope ends yield
    /// `ReputationError::Cancelled`.
    pub async fn run<G>(
        &self,
        calculator: Arc<ReputationCalculator<G>>,
        participants: Vec<Address>,
        scope: &RoundScope,
    ) -> Vec<CalculationResult>
    where
        G: ChainGateway + 'static,
    {
        let total = participants.len();
        let semaphore = Arc::new(Semaphore::new(self.limit));
        let mut tasks = JoinSet::new();

        for participant in participants {
            let calculator = Arc::clone(&calculator);
            let semaphore = Arc::clone(&semaphore);
            let scope = scope.clone();

            tasks.spawn(async move {
                let work = async {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|e| ReputationError::WorkerFailed(e.to_string()))?;
                    calculator.calculate(&participant).await
                };

                let outcome = scope.run(work).await;
                match outcome {
                    Ok(result) => result,
                    Err(reason) => Err(ReputationError::Cancelled {
                        participant,
                        reason,
                    }),
                }
            });
        }

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            results.push(match joined {
                Ok(result) => result,
                Err(e) => Err(ReputationError::WorkerFailed(e.to_string())),
            });
        }

        trace!(total, limit = self.limit, "worker pool drained");
        results
    }
}
