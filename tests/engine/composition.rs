//! Policy nesting: Fallback -> Retry -> CircuitBreaker -> Timeout -> Bulkhead -> call.

use super::support::{failing, flaky, scripted, ServiceError};
use faultguard::core::{invocation, DurationUnit, FailureKind, FaultToleranceError, OperationId};
use faultguard::{
    BulkheadMetadata, CircuitBreakerMetadata, ExecutionManager, FallbackMetadata,
    FallbackStrategy, OperationMetadata, RetryMetadata, TimeoutMetadata,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

fn op(name: &str) -> OperationId {
    OperationId::new("engine::composition", name)
}

fn quick_retry(max_retries: i64) -> RetryMetadata {
    RetryMetadata::new()
        .with_max_retries(max_retries)
        .with_jitter(0, DurationUnit::Millis)
}

#[tokio::test]
async fn retry_sees_the_circuit_open() {
    let manager = ExecutionManager::builder().build();
    let operation = op("circuit_under_retry");
    let metadata = OperationMetadata::new()
        .with_retry(quick_retry(10).with_abort_on([FailureKind::CIRCUIT_OPEN]))
        .with_circuit_breaker(
            CircuitBreakerMetadata::new()
                .with_request_volume_threshold(4)
                .with_failure_ratio(0.5)
                .with_delay(10, DurationUnit::Seconds),
        );
    let calls = Arc::new(AtomicUsize::new(0));

    let err = manager
        .execute(&operation, &metadata, failing(&calls, ServiceError::Unavailable))
        .await
        .unwrap_err();

    assert!(err.is_aborted());
    assert_eq!(err.attempts(), Some(5));
    assert!(err.root().is_circuit_open());
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn fallback_sees_exhausted_retries_of_timed_out_attempts() {
    let manager = ExecutionManager::builder().build();
    let operation = op("timeout_retry_fallback");
    manager.factory().fallback_manager().register_handler(
        &operation,
        FallbackStrategy::<usize, ServiceError>::from_error(|err| {
            assert!(err.root().is_timeout());
            err.attempts().unwrap_or(0) * 100
        }),
    );
    let metadata = OperationMetadata::new()
        .with_retry(quick_retry(1))
        .with_timeout(TimeoutMetadata::new().with_value(50, DurationUnit::Millis))
        .with_fallback(FallbackMetadata::new().with_apply_on([FailureKind::RETRY_EXHAUSTED]));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let start = tokio::time::Instant::now();
    let result = manager
        .execute(
            &operation,
            &metadata,
            invocation(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    Ok::<usize, ServiceError>(1)
                }
            }),
        )
        .await;

    assert_eq!(result.unwrap(), 200);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(start.elapsed() < Duration::from_millis(200));
}

#[tokio::test]
async fn bulkhead_rejection_reaches_the_fallback() {
    let manager = Arc::new(ExecutionManager::builder().build());
    let operation = op("bulkhead_fallback");
    manager
        .factory()
        .fallback_manager()
        .register_handler(&operation, FallbackStrategy::<usize, ServiceError>::value(0));
    let metadata = OperationMetadata::new()
        .with_bulkhead(BulkheadMetadata::new().with_value(1).with_waiting_task_queue(0))
        .with_fallback(FallbackMetadata::new().with_apply_on([FailureKind::BULKHEAD_FULL]));
    let gate = Arc::new(Semaphore::new(0));

    let held = tokio::spawn({
        let manager = Arc::clone(&manager);
        let operation = operation.clone();
        let metadata = metadata.clone();
        let gate = Arc::clone(&gate);
        async move {
            manager
                .execute(
                    &operation,
                    &metadata,
                    invocation(move || {
                        let gate = Arc::clone(&gate);
                        async move {
                            let _pass = gate.acquire().await;
                            Ok::<usize, ServiceError>(7)
                        }
                    }),
                )
                .await
        }
    });

    let bulkhead = loop {
        if let Some(bulkhead) = manager
            .factory()
            .bulkhead_manager()
            .get_bulkhead(operation.as_str())
        {
            if bulkhead.concurrent_executions() == 1 {
                break bulkhead;
            }
        }
        tokio::task::yield_now().await;
    };

    let calls = Arc::new(AtomicUsize::new(0));
    let rejected = manager
        .execute(&operation, &metadata, flaky(&calls, 0))
        .await;
    assert_eq!(rejected.unwrap(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    gate.add_permits(1);
    assert_eq!(held.await.unwrap().unwrap(), 7);
    assert_eq!(bulkhead.available_permits(), 1);
}

#[tokio::test]
async fn prebuilt_bulkhead_named_after_the_operation_is_used() {
    let manager = Arc::new(ExecutionManager::builder().build());
    let operation = op("prebuilt_bulkhead");
    manager
        .factory()
        .bulkhead_manager()
        .new_bulkhead(operation.as_str())
        .with_max_concurrency(1)
        .with_max_waiting(0)
        .build()
        .unwrap();
    // the operation's own metadata would allow 10 concurrent calls
    let metadata = OperationMetadata::new().with_bulkhead(BulkheadMetadata::new());
    let gate = Arc::new(Semaphore::new(0));

    let held = tokio::spawn({
        let manager = Arc::clone(&manager);
        let operation = operation.clone();
        let metadata = metadata.clone();
        let gate = Arc::clone(&gate);
        async move {
            manager
                .execute(
                    &operation,
                    &metadata,
                    invocation(move || {
                        let gate = Arc::clone(&gate);
                        async move {
                            let _pass = gate.acquire().await;
                            Ok::<usize, ServiceError>(1)
                        }
                    }),
                )
                .await
        }
    });

    let bulkhead = manager
        .factory()
        .bulkhead_manager()
        .get_bulkhead(operation.as_str())
        .unwrap();
    while bulkhead.concurrent_executions() != 1 {
        tokio::task::yield_now().await;
    }

    let calls = Arc::new(AtomicUsize::new(0));
    let err = manager
        .execute(&operation, &metadata, flaky(&calls, 0))
        .await
        .unwrap_err();
    match err {
        FaultToleranceError::BulkheadFull {
            max_concurrent,
            max_waiting,
            ..
        } => {
            assert_eq!(max_concurrent, 1);
            assert_eq!(max_waiting, 0);
        }
        other => panic!("expected BulkheadFull, got {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(manager.factory().bulkhead_manager().len(), 1);

    gate.add_permits(1);
    assert_eq!(held.await.unwrap().unwrap(), 1);
}

#[tokio::test]
async fn skipped_failures_bypass_the_fallback() {
    let manager = ExecutionManager::builder().build();
    let operation = op("skip_on");
    manager
        .factory()
        .fallback_manager()
        .register_handler(&operation, FallbackStrategy::<usize, ServiceError>::value(42));
    let metadata = OperationMetadata::new()
        .with_fallback(FallbackMetadata::new().with_skip_on(["bad_request"]));
    let calls = Arc::new(AtomicUsize::new(0));

    let handled = manager
        .execute(&operation, &metadata, failing(&calls, ServiceError::Unavailable))
        .await;
    assert_eq!(handled.unwrap(), 42);

    let skipped = manager
        .execute(&operation, &metadata, failing(&calls, ServiceError::BadRequest))
        .await
        .unwrap_err();
    assert_eq!(skipped.into_operation_error(), Some(ServiceError::BadRequest));
}

#[tokio::test]
async fn retry_recovers_before_the_circuit_trips() {
    let manager = ExecutionManager::builder().build();
    let operation = op("recovering");
    let metadata = OperationMetadata::new()
        .with_retry(quick_retry(3))
        .with_circuit_breaker(CircuitBreakerMetadata::new().with_request_volume_threshold(4));
    let calls = Arc::new(AtomicUsize::new(0));

    let result = manager
        .execute(&operation, &metadata, flaky(&calls, 2))
        .await;

    assert_eq!(result.unwrap(), 2);
    let circuit = manager
        .factory()
        .circuit_breaker_manager()
        .circuit(&operation)
        .unwrap();
    let metrics = circuit.metrics();
    assert_eq!(metrics.window_calls, 3);
    assert_eq!(metrics.failure_count, 2);
}

#[tokio::test]
async fn disabled_policies_are_left_out() {
    let manager = ExecutionManager::builder().build();
    let operation = op("disabled_retry");
    let metadata = OperationMetadata::new()
        .with_retry(quick_retry(5).with_enabled(false))
        .with_timeout(TimeoutMetadata::new().with_value(1, DurationUnit::Seconds));
    let calls = Arc::new(AtomicUsize::new(0));

    let err = manager
        .execute(
            &operation,
            &metadata,
            scripted(&calls, |_| Some(ServiceError::Unavailable)),
        )
        .await
        .unwrap_err();

    assert!(err.is_operation());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(manager.factory().retry_manager().is_empty());
    assert_eq!(manager.factory().timeout_manager().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn racing_first_calls_share_one_plan() {
    let manager = Arc::new(ExecutionManager::builder().build());
    let operation = op("raced");
    let metadata = Arc::new(
        OperationMetadata::new()
            .with_retry(quick_retry(1).with_delay(5, DurationUnit::Millis))
            .with_bulkhead(BulkheadMetadata::new().with_value(32).with_waiting_task_queue(0)),
    );
    let start = Arc::new(tokio::sync::Barrier::new(32));

    let mut handles = Vec::new();
    for _ in 0..32 {
        let manager = Arc::clone(&manager);
        let operation = operation.clone();
        let metadata = Arc::clone(&metadata);
        let start = Arc::clone(&start);
        handles.push(tokio::spawn(async move {
            let calls = Arc::new(AtomicUsize::new(0));
            start.wait().await;
            let err = manager
                .execute(&operation, &metadata, failing(&calls, ServiceError::Unavailable))
                .await
                .unwrap_err();
            (calls.load(Ordering::SeqCst), err.attempts())
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), (2, Some(2)));
    }
    assert_eq!(manager.plan_count(), 1);
}
