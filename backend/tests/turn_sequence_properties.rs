//! Property tests: turn numbers stay contiguous whatever fails in between.

mod common;

use proptest::prelude::*;

use clause_negotiator::adapters::ScriptedModelGateway;
use clause_negotiator::domain::negotiation::{
    ClauseNegotiationState, NegotiationError, ProposalOutcome,
};
use clause_negotiator::ports::GatewayError;

use common::{clause, Harness};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("test runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// `true` = the counterparty answers, `false` = it fails permanently.
    #[test]
    fn sequence_numbers_have_no_gaps(script in proptest::collection::vec(any::<bool>(), 1..12)) {
        let mut gateway = ScriptedModelGateway::new();
        for answers in &script {
            gateway = if *answers {
                gateway.with_outcome(ProposalOutcome::countered("keep going", "1.5 months").unwrap())
            } else {
                gateway.with_counterparty_error(GatewayError::malformed("garbled"))
            };
        }

        let attempts = script.len();
        let successes = script.iter().filter(|ok| **ok).count();

        let (numbers, failures, state) = runtime().block_on(async move {
            let h = Harness::new(gateway).await;
            let id = *h.manager.create_session(&clause("deposit")).await.unwrap().id();

            let mut failures = 0;
            for n in 0..attempts {
                match h.manager.submit_turn(id, &format!("offer {n}")).await {
                    Ok(_) => {}
                    Err(NegotiationError::ModelUnavailable { .. }) => failures += 1,
                    Err(other) => panic!("unexpected error {other:?}"),
                }
            }
            h.manager.drain_background().await;

            let session = h.manager.get_session(id).await.unwrap();
            let numbers: Vec<u32> = session.history().iter().map(|t| t.number().value()).collect();
            (numbers, failures, session.state())
        });

        prop_assert_eq!(failures, attempts - successes);
        let expected: Vec<u32> = (1..=successes as u32).collect();
        prop_assert_eq!(numbers, expected);

        let expected_state = if successes == 0 {
            ClauseNegotiationState::Unopened
        } else {
            ClauseNegotiationState::InNegotiation
        };
        prop_assert_eq!(state, expected_state);
    }
}
