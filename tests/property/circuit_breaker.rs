//! Property tests for the circuit breaker.
//!
//! Invariants tested:
//! - A full window opens the circuit exactly when its failure rate reaches the ratio
//! - Ratios outside [0, 1] never validate
//! - An open circuit ignores further outcomes

use faultguard_circuitbreaker::{
    CircuitBreakerManager, CircuitBreakerMetadata, CircuitBreakerModel, CircuitState,
};
use faultguard_core::{DefinitionError, OperationId};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: state after one full window matches the failure rate
    #[test]
    fn full_window_trips_at_ratio(
        threshold in 1usize..30,
        failures_seed in any::<usize>(),
        ratio in 0.0f64..=1.0,
    ) {
        let failures = failures_seed % (threshold + 1);
        let manager = CircuitBreakerManager::new();
        let circuit = manager
            .get_or_create(
                &OperationId::new("property::circuit", "window"),
                &CircuitBreakerMetadata::new()
                    .with_request_volume_threshold(threshold as i64)
                    .with_failure_ratio(ratio),
            )
            .unwrap();

        for _ in 0..threshold - failures {
            circuit.record_success();
        }
        for _ in 0..failures {
            circuit.record_failure();
        }

        let rate = failures as f64 / threshold as f64;
        let expected = if rate >= ratio { CircuitState::Open } else { CircuitState::Closed };
        prop_assert_eq!(circuit.state(), expected);
    }

    /// Property: ratios above 1 are rejected
    #[test]
    fn ratio_above_one_rejected(ratio in 1.000_001f64..1_000.0) {
        let result = CircuitBreakerModel::from_metadata(
            &CircuitBreakerMetadata::new().with_failure_ratio(ratio),
        );
        let out_of_range = matches!(
            result,
            Err(DefinitionError::OutOfRange { field: "failure_ratio", .. })
        );
        prop_assert!(out_of_range);
    }

    /// Property: negative ratios are rejected
    #[test]
    fn negative_ratio_rejected(ratio in -1_000.0f64..-0.000_001) {
        prop_assert!(
            CircuitBreakerModel::from_metadata(
                &CircuitBreakerMetadata::new().with_failure_ratio(ratio),
            )
            .is_err()
        );
    }

    /// Property: outcomes recorded while open change nothing
    #[test]
    fn open_circuit_ignores_outcomes(outcomes in prop::collection::vec(any::<bool>(), 0..50)) {
        let manager = CircuitBreakerManager::new();
        let circuit = manager
            .get_or_create(
                &OperationId::new("property::circuit", "open"),
                &CircuitBreakerMetadata::new().with_request_volume_threshold(1),
            )
            .unwrap();
        circuit.force_open();
        let before = circuit.metrics();

        for failed in outcomes {
            if failed {
                circuit.record_failure();
            } else {
                circuit.record_success();
            }
        }

        let after = circuit.metrics();
        prop_assert_eq!(after.state, CircuitState::Open);
        prop_assert_eq!(after.window_calls, before.window_calls);
        prop_assert_eq!(after.failure_count, before.failure_count);
    }
}
