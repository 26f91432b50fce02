//! Health reporting from circuit state.
//!
//! Circuit state and window metrics are read synchronously, so a health
//! endpoint can report them without touching the guarded call path.
//!
//! Run with:
//! ```bash
//! cargo run -p faultguard-circuitbreaker --example circuit_health
//! ```

use faultguard_circuitbreaker::{
    CircuitBreakerManager, CircuitBreakerMetadata, CircuitMetrics, CircuitState,
};
use faultguard_core::{invocation, DurationUnit, ExecutionPlan, OperationId, Proceed};
use std::time::Duration;

#[derive(Debug)]
struct HealthStatus {
    status: &'static str,
    http_status: u16,
    metrics: CircuitMetrics,
}

fn check_health(manager: &CircuitBreakerManager, operation: &OperationId) -> Option<HealthStatus> {
    let metrics = manager.circuit(operation)?.metrics();
    let (status, http_status) = match metrics.state {
        CircuitState::Closed => ("healthy", 200),
        CircuitState::HalfOpen => ("degraded", 200),
        CircuitState::Open => ("unavailable", 503),
    };
    Some(HealthStatus {
        status,
        http_status,
        metrics,
    })
}

#[tokio::main]
async fn main() {
    let manager = CircuitBreakerManager::new();
    let operation = OperationId::new("inventory::Backend", "reserve");
    let circuit = manager
        .get_or_create(
            &operation,
            &CircuitBreakerMetadata::new()
                .with_request_volume_threshold(4)
                .with_failure_ratio(0.5)
                .with_delay(200, DurationUnit::Millis),
        )
        .expect("valid circuit breaker metadata");
    let plan = manager.plan(circuit, Proceed::shared());

    for request in ["a", "fail", "b", "fail", "fail", "c"] {
        let result = plan
            .execute(invocation(move || async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                if request == "fail" {
                    Err(std::io::Error::other("backend error"))
                } else {
                    Ok(format!("reserved {request}"))
                }
            }))
            .await;

        let health = check_health(&manager, &operation).expect("circuit exists");
        println!(
            "{request:>5} -> {:<40} health: {} ({}), failure rate {:.2}",
            format!("{result:?}"),
            health.status,
            health.http_status,
            health.metrics.failure_rate
        );
    }

    tokio::time::sleep(Duration::from_millis(250)).await;
    let result = plan
        .execute(invocation(|| async { Ok::<_, std::io::Error>("recovered".to_string()) }))
        .await;
    let health = check_health(&manager, &operation).expect("circuit exists");
    println!("after delay -> {result:?}, health: {health:?}");
}
