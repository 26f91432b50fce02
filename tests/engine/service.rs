//! Guarding tower services with `FaultToleranceLayer`.

use super::support::ServiceError;
use faultguard::core::{DurationUnit, OperationId};
use faultguard::{
    CircuitBreakerMetadata, ExecutionManager, FallbackMetadata, FallbackStrategy,
    FaultToleranceLayer, OperationMetadata, RetryMetadata, TimeoutMetadata,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::{service_fn, Service, ServiceBuilder, ServiceExt};

#[tokio::test]
async fn service_builder_stack() {
    let manager = Arc::new(ExecutionManager::builder().build());
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);

    let mut service = ServiceBuilder::new()
        .layer(FaultToleranceLayer::new(
            Arc::clone(&manager),
            OperationId::new("engine::service", "greet"),
            OperationMetadata::new()
                .with_retry(
                    RetryMetadata::new()
                        .with_max_retries(2)
                        .with_jitter(0, DurationUnit::Millis),
                )
                .with_circuit_breaker(CircuitBreakerMetadata::new()),
        ))
        .service(service_fn(move |name: String| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(ServiceError::Unavailable)
                } else {
                    Ok(format!("hello, {name}"))
                }
            }
        }));

    let greeting = service
        .ready()
        .await
        .unwrap()
        .call("ferris".to_string())
        .await
        .unwrap();

    assert_eq!(greeting, "hello, ferris");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(manager.plan_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_responses_fall_back() {
    let manager = Arc::new(ExecutionManager::builder().build());
    let operation = OperationId::new("engine::service", "lookup");
    manager
        .factory()
        .fallback_manager()
        .register_handler(&operation, FallbackStrategy::<u32, ServiceError>::value(0));

    let layer = FaultToleranceLayer::new(
        Arc::clone(&manager),
        operation,
        OperationMetadata::new()
            .with_timeout(TimeoutMetadata::new().with_value(100, DurationUnit::Millis))
            .with_fallback(FallbackMetadata::new()),
    );
    let service = ServiceBuilder::new()
        .layer(layer)
        .service(service_fn(|delay_ms: u64| async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok::<u32, ServiceError>(1)
        }));

    assert_eq!(service.clone().oneshot(10).await.unwrap(), 1);
    assert_eq!(service.oneshot(500).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn clones_share_one_plan() {
    let manager = Arc::new(ExecutionManager::builder().build());
    let layer = FaultToleranceLayer::new(
        Arc::clone(&manager),
        OperationId::new("engine::service", "shared"),
        OperationMetadata::new().with_timeout(TimeoutMetadata::new()),
    );
    let service = ServiceBuilder::new()
        .layer(layer)
        .service(service_fn(|n: u32| async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok::<_, ServiceError>(n + 1)
        }));
    let start = Arc::new(tokio::sync::Barrier::new(8));

    let mut handles = Vec::new();
    for n in 0..8 {
        let service = service.clone();
        let start = Arc::clone(&start);
        handles.push(tokio::spawn(async move {
            start.wait().await;
            service.oneshot(n).await
        }));
    }
    for (n, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap().unwrap(), n as u32 + 1);
    }
    assert_eq!(manager.plan_count(), 1);
}
