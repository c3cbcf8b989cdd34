//! # Reputation Calculator
//!
//! Computes one participant's record from two gateway calls: peer identity
//! resolution followed by the `IsSlashed` state call.

use std::sync::Arc;

use crate::domain::{
    decode_slashed, Address, MethodNum, Reputation, ReputationError, StateQuery,
};
use crate::ports::ChainGateway;

/// Per-participant calculator. Stateless apart from the gateway handle.
pub struct ReputationCalculator<G> {
    gateway: Arc<G>,
    method: MethodNum,
}

impl<G: ChainGateway> ReputationCalculator<G> {
    /// Calculator using the gateway's slashed-status method.
    pub fn new(gateway: Arc<G>) -> Self {
        let method = gateway.slashed_method();
        Self::with_method(gateway, method)
    }

    /// Calculator calling a custom slashed-status method.
    pub fn with_method(gateway: Arc<G>, method: MethodNum) -> Self {
        Self { gateway, method }
    }

    /// Method number used for the slashed-status call.
    pub fn method(&self) -> MethodNum {
        self.method
    }

    /// Calculate the reputation of `participant`.
    ///
    /// # Errors
    ///
    /// - `LookupFailed` if the peer identity cannot be resolved
    /// - `QueryFailed` if the state call fails in transit
    /// - `RemoteRejected` if the actor returns a non-zero exit code
    pub async fn calculate(&self, participant: &Address) -> Result<Reputation, ReputationError> {
        let peer_id = self
            .gateway
            .resolve_peer_identity(participant)
            .await
            .map_err(|cause| ReputationError::LookupFailed {
                participant: participant.clone(),
                cause,
            })?;

        let query = StateQuery::self_call(participant, self.method);
        let result = self
            .gateway
            .query_state(&query)
            .await
            .map_err(|cause| ReputationError::QueryFailed {
                participant: participant.clone(),
                cause,
            })?;

        if !result.is_success() {
            return Err(ReputationError::RemoteRejected {
                participant: participant.clone(),
                code: result.exit_code,
            });
        }

        Ok(Reputation::new(
            participant.clone(),
            peer_id,
            decode_slashed(&result.return_data),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GatewayError, PeerId};
    use crate::testing::{MockChainGateway, ParticipantBehaviour};

    fn calculator(gateway: MockChainGateway) -> ReputationCalculator<MockChainGateway> {
        ReputationCalculator::new(Arc::new(gateway))
    }

    #[tokio::test]
    async fn test_calculate_healthy_participant() {
        let addr = Address::from_actor_id(1000);
        let calc = calculator(
            MockChainGateway::new()
                .with_participant(addr.clone(), ParticipantBehaviour::Healthy { slashed: false }),
        );

        let rep = calc.calculate(&addr).await.unwrap();
        assert_eq!(rep.address, addr);
        assert_eq!(rep.peer_id, MockChainGateway::peer_id_for(&addr));
        assert!(!rep.slashed);
    }

    #[tokio::test]
    async fn test_calculate_slashed_participant() {
        let addr = Address::from_actor_id(1001);
        let calc = calculator(
            MockChainGateway::new()
                .with_participant(addr.clone(), ParticipantBehaviour::Healthy { slashed: true }),
        );

        assert!(calc.calculate(&addr).await.unwrap().slashed);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_tagged() {
        let addr = Address::from_actor_id(1002);
        let gateway = MockChainGateway::new()
            .with_participant(addr.clone(), ParticipantBehaviour::LookupFails);
        let calc = calculator(gateway);

        let err = calc.calculate(&addr).await.unwrap_err();
        assert!(matches!(
            err,
            ReputationError::LookupFailed { ref participant, cause: GatewayError::NotFound(_) }
                if participant == &addr
        ));
    }

    #[tokio::test]
    async fn test_lookup_failure_skips_state_call() {
        let addr = Address::from_actor_id(1003);
        let gateway = Arc::new(
            MockChainGateway::new()
                .with_participant(addr.clone(), ParticipantBehaviour::LookupFails),
        );
        let calc = ReputationCalculator::new(Arc::clone(&gateway));

        let _ = calc.calculate(&addr).await;
        assert_eq!(gateway.state_calls(), 0);
    }

    #[tokio::test]
    async fn test_query_failure_is_tagged() {
        let addr = Address::from_actor_id(1004);
        let calc = calculator(
            MockChainGateway::new()
                .with_participant(addr.clone(), ParticipantBehaviour::QueryFails),
        );

        let err = calc.calculate(&addr).await.unwrap_err();
        assert_eq!(err.kind(), "query_failed");
    }

    #[tokio::test]
    async fn test_non_zero_exit_code_is_rejected() {
        let addr = Address::from_actor_id(1005);
        let calc = calculator(
            MockChainGateway::new()
                .with_participant(addr.clone(), ParticipantBehaviour::Rejects(16)),
        );

        let err = calc.calculate(&addr).await.unwrap_err();
        assert_eq!(
            err,
            ReputationError::RemoteRejected {
                participant: addr,
                code: 16
            }
        );
    }

    #[tokio::test]
    async fn test_custom_method_is_forwarded() {
        let addr = Address::from_actor_id(1006);
        let gateway = Arc::new(
            MockChainGateway::new()
                .with_participant(addr.clone(), ParticipantBehaviour::Healthy { slashed: false }),
        );
        let calc = ReputationCalculator::with_method(Arc::clone(&gateway), MethodNum(42));

        calc.calculate(&addr).await.unwrap();
        assert_eq!(calc.method(), MethodNum(42));
        assert_eq!(gateway.last_method(), Some(MethodNum(42)));
    }

    #[test]
    fn test_default_method_is_is_slashed() {
        let calc = calculator(MockChainGateway::new());
        assert_eq!(calc.method(), crate::domain::IS_SLASHED_METHOD);
    }

    #[tokio::test]
    async fn test_calculation_is_deterministic() {
        let addr = Address::from_actor_id(1007);
        let calc = calculator(
            MockChainGateway::new()
                .with_participant(addr.clone(), ParticipantBehaviour::Healthy { slashed: true }),
        );

        let first = calc.calculate(&addr).await.unwrap();
        let second = calc.calculate(&addr).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.peer_id, PeerId::new(format!("12D3KooW{addr}")));
    }
}
