//! A flaky client guarded by retry, timeout, circuit breaker and fallback.
//!
//! Run with `cargo run -p faultguard --example guarded_client`.

use faultguard::core::{
    invocation, operation_id, Classify, DurationUnit, EventListeners, FailureKind, PolicyEvent,
};
use faultguard::retry::{RetryEvent, RetryManager};
use faultguard::{
    CircuitBreakerMetadata, ExecutionManager, FallbackMetadata, FallbackStrategy,
    OperationMetadata, RetryMetadata, TimeoutMetadata,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
enum ClientError {
    Unavailable,
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Unavailable => f.write_str("unavailable"),
        }
    }
}

impl Classify for ClientError {
    fn kind(&self) -> FailureKind {
        match self {
            ClientError::Unavailable => FailureKind::new("unavailable"),
        }
    }
}

#[tokio::main]
async fn main() {
    let mut listeners = EventListeners::new();
    listeners.add_fn(|event: &RetryEvent| {
        println!("  retry event: {} on {}", event.event_type(), event.operation());
    });

    let manager = ExecutionManager::builder()
        .retry_manager(Arc::new(RetryManager::with_listeners(listeners)))
        .build();

    let operation = operation_id!(fetch_quote);
    manager
        .factory()
        .fallback_manager()
        .register_handler(&operation, FallbackStrategy::<u32, ClientError>::value(0));

    let metadata = OperationMetadata::new()
        .with_retry(
            RetryMetadata::new()
                .with_max_retries(3)
                .with_delay(20, DurationUnit::Millis)
                .with_jitter(10, DurationUnit::Millis),
        )
        .with_timeout(TimeoutMetadata::new().with_value(100, DurationUnit::Millis))
        .with_circuit_breaker(
            CircuitBreakerMetadata::new()
                .with_request_volume_threshold(4)
                .with_failure_ratio(0.75),
        )
        .with_fallback(FallbackMetadata::new());

    if let Err(err) = manager.validate(&operation, &metadata) {
        eprintln!("invalid policy: {err}");
        return;
    }

    let calls = Arc::new(AtomicUsize::new(0));
    for round in 1..=3 {
        let counter = Arc::clone(&calls);
        let call = invocation(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                match n % 3 {
                    0 => Err::<u32, _>(ClientError::Unavailable),
                    1 => {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        Ok(1)
                    }
                    _ => Ok(42),
                }
            }
        });

        match manager.execute(&operation, &metadata, call).await {
            Ok(quote) => println!("round {round}: quote = {quote}"),
            Err(err) => println!("round {round}: failed: {err}"),
        }
    }

    println!(
        "{} underlying calls, {} cached plan(s)",
        calls.load(Ordering::SeqCst),
        manager.plan_count()
    );
}
