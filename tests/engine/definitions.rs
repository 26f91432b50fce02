//! Validation and plan cache failure modes.

use super::support::{flaky, ServiceError};
use faultguard::core::{DefinitionError, DurationUnit, OperationId};
use faultguard::{
    BulkheadMetadata, CircuitBreakerMetadata, ExecutionManager, FallbackMetadata,
    FallbackStrategy, OperationMetadata, RetryMetadata, TimeoutMetadata,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn op(name: &str) -> OperationId {
    OperationId::new("engine::definitions", name)
}

#[test]
fn every_policy_is_validated() {
    let manager = ExecutionManager::builder().build();
    let cases = [
        (
            "retry_delay",
            OperationMetadata::new().with_retry(
                RetryMetadata::new()
                    .with_delay(5, DurationUnit::Seconds)
                    .with_max_duration(1, DurationUnit::Seconds),
            ),
        ),
        (
            "breaker_ratio",
            OperationMetadata::new()
                .with_circuit_breaker(CircuitBreakerMetadata::new().with_failure_ratio(1.5)),
        ),
        (
            "breaker_volume",
            OperationMetadata::new().with_circuit_breaker(
                CircuitBreakerMetadata::new().with_request_volume_threshold(0),
            ),
        ),
        (
            "timeout_negative",
            OperationMetadata::new()
                .with_timeout(TimeoutMetadata::new().with_value(-5, DurationUnit::Millis)),
        ),
        (
            "bulkhead_zero",
            OperationMetadata::new().with_bulkhead(BulkheadMetadata::new().with_value(0)),
        ),
        (
            "fallback_unregistered",
            OperationMetadata::new().with_fallback(FallbackMetadata::new()),
        ),
    ];

    for (name, metadata) in &cases {
        let err = manager.validate(&op(name), metadata).unwrap_err();
        match &err {
            DefinitionError::InOperation { operation, .. } => assert_eq!(*operation, op(name)),
            other => panic!("{name}: missing operation context in {other:?}"),
        }
    }

    let operations: Vec<_> = cases.iter().map(|(name, _)| op(name)).collect();
    let problems = manager
        .validate_all(operations.iter().zip(cases.iter().map(|(_, metadata)| metadata)))
        .unwrap_err();
    assert_eq!(problems.len(), cases.len());
}

#[test]
fn disabled_invalid_policies_are_not_validated() {
    let manager = ExecutionManager::builder().build();
    let metadata = OperationMetadata::new().with_retry(
        RetryMetadata::new()
            .with_max_retries(-1)
            .with_enabled(false),
    );
    assert!(manager.validate(&op("disabled"), &metadata).is_ok());
}

#[test]
fn duration_overflow_is_reported() {
    let manager = ExecutionManager::builder().build();
    let metadata = OperationMetadata::new()
        .with_timeout(TimeoutMetadata::new().with_value(i64::MAX, DurationUnit::Days));
    let err = manager.validate(&op("overflow"), &metadata).unwrap_err();
    assert!(matches!(
        err.root(),
        DefinitionError::Overflow {
            policy: "timeout",
            ..
        }
    ));
}

#[tokio::test]
async fn invalid_metadata_fails_every_call_without_running_it() {
    let manager = ExecutionManager::builder().build();
    let operation = op("broken_retry");
    let metadata = OperationMetadata::new().with_retry(RetryMetadata::new().with_max_retries(-2));
    let calls = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let err = manager
            .execute(&operation, &metadata, flaky(&calls, 0))
            .await
            .unwrap_err();
        assert!(err.is_definition());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(manager.plan_count(), 0);
}

#[tokio::test]
async fn fallback_handler_types_must_match_the_call() {
    let manager = ExecutionManager::builder().build();
    let operation = op("typed_fallback");
    manager
        .factory()
        .fallback_manager()
        .register_handler(&operation, FallbackStrategy::<String, ServiceError>::value(String::new()));
    let metadata = OperationMetadata::new().with_fallback(FallbackMetadata::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let err = manager
        .execute(&operation, &metadata, flaky(&calls, 0))
        .await
        .unwrap_err();

    match err {
        faultguard::FaultToleranceError::Definition(definition) => assert_eq!(
            *definition.root(),
            DefinitionError::PlanTypeMismatch { operation }
        ),
        other => panic!("expected a definition error, got {other:?}"),
    }
}

#[tokio::test]
async fn class_level_policies_are_inherited() {
    let manager = ExecutionManager::builder().build();
    let class_level = OperationMetadata::new()
        .with_retry(
            RetryMetadata::new()
                .with_max_retries(4)
                .with_jitter(0, DurationUnit::Millis),
        )
        .with_timeout(TimeoutMetadata::new());
    let method_level = OperationMetadata::new()
        .with_retry(
            RetryMetadata::new()
                .with_max_retries(1)
                .with_jitter(0, DurationUnit::Millis),
        )
        .inherit(&class_level);
    let calls = Arc::new(AtomicUsize::new(0));

    let err = manager
        .execute(&op("inherited"), &method_level, flaky(&calls, 10))
        .await
        .unwrap_err();

    assert!(err.is_retry_exhausted());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(manager.factory().timeout_manager().len(), 1);
}
