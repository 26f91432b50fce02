//! Circuit breaker policy for faultguard.
//!
//! A circuit breaker stops calling an operation that keeps failing, giving
//! it time to recover before traffic resumes.
//!
//! ## States
//! - **Closed**: normal operation, every call passes and its outcome enters a
//!   rolling window of the last `request_volume_threshold` calls
//! - **Open**: the window's failure share reached `failure_ratio`; calls are
//!   rejected with [`FaultToleranceError::CircuitOpen`] for `delay`
//! - **Half-Open**: trial calls pass; `success_threshold` consecutive
//!   successes close the circuit and any failure reopens it
//!
//! An outcome counts as a failure when `fail_on` matches it and `skip_on`
//! does not. Everything else, including failures of unlisted kinds, counts
//! as a success.
//!
//! ## Usage
//!
//! ```
//! use faultguard_circuitbreaker::{CircuitBreakerManager, CircuitBreakerMetadata, CircuitState};
//! use faultguard_core::{invocation, ExecutionPlan, OperationId, Proceed};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let manager = CircuitBreakerManager::new();
//! let operation = OperationId::new("app::Inventory", "reserve");
//! let metadata = CircuitBreakerMetadata::new()
//!     .with_request_volume_threshold(2)
//!     .with_failure_ratio(1.0);
//! let circuit = manager.get_or_create(&operation, &metadata).unwrap();
//! let plan = manager.plan(circuit, Proceed::shared());
//!
//! for _ in 0..2 {
//!     let _ = plan
//!         .execute(invocation(|| async {
//!             Err::<(), _>(std::io::Error::other("down"))
//!         }))
//!         .await;
//! }
//! assert_eq!(manager.state(&operation), Some(CircuitState::Open));
//!
//! let err = plan.execute(invocation(|| async { Ok(()) })).await.unwrap_err();
//! assert!(err.is_circuit_open());
//! # }
//! ```
//!
//! ## Feature Flags
//! - `tracing`: logs state transitions at info level
//! - `serde`: enables serde for `CircuitBreakerMetadata`, `CircuitState` and
//!   `CircuitMetrics`

mod circuit;
mod config;
mod events;
mod manager;
mod model;

pub use circuit::{CircuitBreaker, CircuitMetrics, CircuitState};
pub use config::CircuitBreakerMetadata;
pub use events::CircuitBreakerEvent;
pub use manager::CircuitBreakerManager;
pub use model::CircuitBreakerModel;

use faultguard_core::{
    Classify, ExecutionPlan, FaultToleranceError, Invocation, PlanFuture, SharedPlan,
};
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Execution plan guarding the wrapped plan with a [`CircuitBreaker`].
///
/// Disabled circuits pass every call through. The engine never composes
/// one; see [`CircuitBreakerManager::plan`].
pub struct CircuitBreakerPlan<T, E> {
    circuit: Arc<CircuitBreaker>,
    inner: SharedPlan<T, E>,
}

impl<T, E> CircuitBreakerPlan<T, E> {
    /// Creates a plan guarding `inner` with `circuit`.
    pub fn new(circuit: Arc<CircuitBreaker>, inner: SharedPlan<T, E>) -> Self {
        Self { circuit, inner }
    }

    pub fn circuit(&self) -> &Arc<CircuitBreaker> {
        &self.circuit
    }
}

impl<T, E> ExecutionPlan<T, E> for CircuitBreakerPlan<T, E>
where
    T: Send + 'static,
    E: Classify + Send + 'static,
{
    fn execute(&self, invocation: Invocation<T, E>) -> PlanFuture<T, E> {
        if self.circuit.model().is_disabled() {
            return self.inner.execute(invocation);
        }

        let circuit = Arc::clone(&self.circuit);
        let inner = Arc::clone(&self.inner);

        Box::pin(async move {
            if !circuit.try_acquire() {
                #[cfg(feature = "tracing")]
                debug!(operation = %circuit.operation(), "Call rejected by open circuit");

                return Err(FaultToleranceError::CircuitOpen {
                    operation: circuit.operation().clone(),
                });
            }

            let result = inner.execute(invocation).await;
            match &result {
                Err(failure) if circuit.model().counts_as_failure(failure) => {
                    circuit.record_failure()
                }
                _ => circuit.record_success(),
            }
            result
        })
    }
}
