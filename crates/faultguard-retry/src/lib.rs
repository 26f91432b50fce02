//! Retry policy for faultguard.
//!
//! A retry policy re-runs a failed call until it succeeds, the failure is
//! not retryable, the retry budget is spent, or the time budget for the
//! logical call runs out.
//!
//! - [`RetryMetadata`]: declarative parameters (`max_retries`, `delay`,
//!   `max_duration`, `jitter`, `retry_on`, `abort_on`)
//! - [`RetryModel`]: the validated, immutable policy, including the
//!   jittered pause computation
//! - [`RetryManager`]: per-operation model cache
//! - [`RetryPlan`]: the execution plan running the retry loop
//!
//! # Retry loop
//!
//! After every failed attempt the plan checks, in order:
//!
//! 1. `abort_on` matches: stop with [`FaultToleranceError::Aborted`]
//! 2. `max_retries` already used: stop with [`FaultToleranceError::RetryExhausted`]
//! 3. the deadline (`start + max_duration`) has passed: stop with
//!    [`FaultToleranceError::DeadlineExceeded`]
//! 4. `retry_on` does not match: stop with [`FaultToleranceError::Aborted`]
//! 5. otherwise sleep for [`RetryModel::next_pause`] and try again
//!
//! The retry count and the deadline belong to the logical call, not to the
//! plan, so concurrent calls through one cached plan never share them.
//!
//! # Examples
//!
//! ```
//! use faultguard_core::{invocation, Classify, DurationUnit, ExecutionPlan, FailureKind, OperationId, Proceed};
//! use faultguard_retry::{RetryManager, RetryMetadata};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct Flaky;
//!
//! impl Classify for Flaky {
//!     fn kind(&self) -> FailureKind {
//!         FailureKind::new("flaky")
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let manager = RetryManager::new();
//! let operation = OperationId::new("app::Client", "fetch");
//! let metadata = RetryMetadata::new()
//!     .with_max_retries(2)
//!     .with_jitter(0, DurationUnit::Millis);
//! let model = manager.get_or_create(&operation, &metadata).unwrap();
//! let plan = manager.plan(&operation, model, Proceed::shared());
//!
//! let calls = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&calls);
//! let result = plan
//!     .execute(invocation(move || {
//!         let n = counter.fetch_add(1, Ordering::SeqCst);
//!         async move { if n < 2 { Err(Flaky) } else { Ok(n) } }
//!     }))
//!     .await;
//!
//! assert_eq!(result.unwrap(), 2);
//! assert_eq!(calls.load(Ordering::SeqCst), 3);
//! # }
//! ```

mod config;
mod events;
mod manager;
mod model;

pub use config::RetryMetadata;
pub use events::RetryEvent;
pub use manager::RetryManager;
pub use model::RetryModel;

use faultguard_core::{
    Classify, EventListeners, ExecutionPlan, FaultToleranceError, Invocation, OperationId,
    PlanFuture, SharedPlan,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Execution plan that retries the wrapped plan.
///
/// A plan made from a disabled model runs the call once. Only plans built
/// directly with [`RetryManager::plan`] can see one; the engine leaves
/// disabled policies out of the chain.
pub struct RetryPlan<T, E> {
    operation: OperationId,
    model: Arc<RetryModel>,
    listeners: Arc<EventListeners<RetryEvent>>,
    inner: SharedPlan<T, E>,
}

impl<T, E> RetryPlan<T, E> {
    /// Creates a retry plan around `inner`.
    pub fn new(
        operation: OperationId,
        model: Arc<RetryModel>,
        listeners: Arc<EventListeners<RetryEvent>>,
        inner: SharedPlan<T, E>,
    ) -> Self {
        Self {
            operation,
            model,
            listeners,
            inner,
        }
    }

    /// The policy this plan applies.
    pub fn model(&self) -> &RetryModel {
        &self.model
    }
}

/// Retry bookkeeping for one logical call.
struct RetryState {
    retries: usize,
    start: Instant,
    deadline: Option<Instant>,
}

impl RetryState {
    fn begin(max_duration: Duration) -> Self {
        let start = Instant::now();
        Self {
            retries: 0,
            start,
            deadline: start.checked_add(max_duration),
        }
    }

    fn attempts(&self) -> usize {
        self.retries + 1
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// What to do after a failed attempt.
enum Verdict {
    Aborted,
    Exhausted,
    DeadlineExceeded,
    Retry,
}

fn judge<E: Classify>(
    model: &RetryModel,
    state: &RetryState,
    failure: &FaultToleranceError<E>,
) -> Verdict {
    if model.aborts_on(failure) {
        Verdict::Aborted
    } else if state.retries >= model.max_retries() {
        Verdict::Exhausted
    } else if state.deadline_passed() {
        Verdict::DeadlineExceeded
    } else if !model.retries_on(failure) {
        Verdict::Aborted
    } else {
        Verdict::Retry
    }
}

impl<T, E> ExecutionPlan<T, E> for RetryPlan<T, E>
where
    T: Send + 'static,
    E: Classify + Send + 'static,
{
    fn execute(&self, invocation: Invocation<T, E>) -> PlanFuture<T, E> {
        if self.model.is_disabled() {
            return self.inner.execute(invocation);
        }

        let operation = self.operation.clone();
        let model = Arc::clone(&self.model);
        let listeners = Arc::clone(&self.listeners);
        let inner = Arc::clone(&self.inner);

        Box::pin(async move {
            let mut state = RetryState::begin(model.max_duration());

            loop {
                let failure = match inner.execute(Arc::clone(&invocation)).await {
                    Ok(value) => {
                        listeners.emit(&RetryEvent::Success {
                            operation: operation.to_string(),
                            timestamp: std::time::Instant::now(),
                            attempts: state.attempts(),
                        });
                        return Ok(value);
                    }
                    Err(failure) => failure,
                };

                let attempts = state.attempts();
                match judge(&model, &state, &failure) {
                    Verdict::Aborted => {
                        listeners.emit(&RetryEvent::Aborted {
                            operation: operation.to_string(),
                            timestamp: std::time::Instant::now(),
                            attempts,
                        });

                        #[cfg(feature = "tracing")]
                        debug!(operation = %operation, attempts, "Failure is not retryable");

                        return Err(FaultToleranceError::Aborted {
                            attempts,
                            source: Box::new(failure),
                        });
                    }
                    Verdict::Exhausted => {
                        listeners.emit(&RetryEvent::Exhausted {
                            operation: operation.to_string(),
                            timestamp: std::time::Instant::now(),
                            attempts,
                        });

                        #[cfg(feature = "tracing")]
                        debug!(operation = %operation, attempts, "Retries exhausted");

                        return Err(FaultToleranceError::RetryExhausted {
                            attempts,
                            source: Box::new(failure),
                        });
                    }
                    Verdict::DeadlineExceeded => {
                        let elapsed = state.start.elapsed();
                        listeners.emit(&RetryEvent::DeadlineExceeded {
                            operation: operation.to_string(),
                            timestamp: std::time::Instant::now(),
                            attempts,
                            elapsed,
                        });

                        #[cfg(feature = "tracing")]
                        debug!(
                            operation = %operation,
                            attempts,
                            elapsed_ms = elapsed.as_millis(),
                            "Retry deadline exceeded"
                        );

                        return Err(FaultToleranceError::DeadlineExceeded {
                            attempts,
                            elapsed,
                            source: Box::new(failure),
                        });
                    }
                    Verdict::Retry => {
                        state.retries += 1;
                        let delay = model.next_pause();
                        listeners.emit(&RetryEvent::Retry {
                            operation: operation.to_string(),
                            timestamp: std::time::Instant::now(),
                            attempt: state.retries,
                            delay,
                        });

                        #[cfg(feature = "tracing")]
                        debug!(
                            operation = %operation,
                            attempt = state.retries,
                            delay_ms = delay.as_millis(),
                            "Retrying after failure"
                        );

                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
        })
    }
}
