//! Timeout policy for faultguard.
//!
//! A [`TimeoutPlan`] races the wrapped plan against a deadline. If the
//! deadline passes first the wrapped future is dropped and the call fails
//! with [`FaultToleranceError::Timeout`].
//!
//! ```
//! use faultguard_core::{invocation, DurationUnit, ExecutionPlan, OperationId, Proceed};
//! use faultguard_timelimiter::{TimeoutManager, TimeoutMetadata};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let manager = TimeoutManager::new();
//! let operation = OperationId::new("app::Search", "query");
//! let model = manager
//!     .get_or_create(&operation, &TimeoutMetadata::new().with_value(20, DurationUnit::Millis))
//!     .unwrap();
//! let plan = manager.plan(&operation, model, Proceed::shared());
//!
//! let err = plan
//!     .execute(invocation(|| async {
//!         tokio::time::sleep(Duration::from_secs(1)).await;
//!         Ok::<_, std::io::Error>("late")
//!     }))
//!     .await
//!     .unwrap_err();
//! assert!(err.is_timeout());
//! # }
//! ```

mod config;
mod events;
mod manager;
mod model;

pub use config::TimeoutMetadata;
pub use events::TimeoutEvent;
pub use manager::TimeoutManager;
pub use model::TimeoutModel;

use faultguard_core::{
    EventListeners, ExecutionPlan, FaultToleranceError, Invocation, OperationId, PlanFuture,
    SharedPlan,
};
use std::sync::Arc;
use tokio::time::{timeout_at, Instant};

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Execution plan bounding the wrapped plan by a timeout.
///
/// [`execute`](ExecutionPlan::execute) skips the timeout when the model is
/// disabled, which only happens for plans made with [`TimeoutManager::plan`].
pub struct TimeoutPlan<T, E> {
    operation: OperationId,
    model: Arc<TimeoutModel>,
    listeners: Arc<EventListeners<TimeoutEvent>>,
    inner: SharedPlan<T, E>,
}

impl<T, E> TimeoutPlan<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Creates a plan bounding `inner` by `model`'s timeout.
    pub fn new(
        operation: OperationId,
        model: Arc<TimeoutModel>,
        listeners: Arc<EventListeners<TimeoutEvent>>,
        inner: SharedPlan<T, E>,
    ) -> Self {
        Self {
            operation,
            model,
            listeners,
            inner,
        }
    }

    pub fn model(&self) -> &Arc<TimeoutModel> {
        &self.model
    }

    /// Runs `invocation` through the wrapped plan, failing with
    /// [`FaultToleranceError::Timeout`] if it is still running at `deadline`.
    pub fn execute_by(&self, invocation: Invocation<T, E>, deadline: Instant) -> PlanFuture<T, E> {
        let operation = self.operation.clone();
        let timeout = self.model.timeout();
        let listeners = Arc::clone(&self.listeners);
        let call = self.inner.execute(invocation);

        Box::pin(async move {
            let start = Instant::now();

            match timeout_at(deadline, call).await {
                Ok(Ok(value)) => {
                    let duration = start.elapsed();
                    listeners.emit(&TimeoutEvent::Success {
                        operation: operation.to_string(),
                        timestamp: std::time::Instant::now(),
                        duration,
                    });

                    #[cfg(feature = "tracing")]
                    debug!(
                        operation = %operation,
                        duration_ms = duration.as_millis(),
                        "Call succeeded within timeout"
                    );

                    Ok(value)
                }
                Ok(Err(err)) => {
                    listeners.emit(&TimeoutEvent::Error {
                        operation: operation.to_string(),
                        timestamp: std::time::Instant::now(),
                        duration: start.elapsed(),
                    });
                    Err(err)
                }
                Err(_elapsed) => {
                    listeners.emit(&TimeoutEvent::Timeout {
                        operation: operation.to_string(),
                        timestamp: std::time::Instant::now(),
                        timeout,
                    });

                    #[cfg(feature = "tracing")]
                    warn!(
                        operation = %operation,
                        timeout_ms = timeout.as_millis(),
                        "Call timed out"
                    );

                    Err(FaultToleranceError::Timeout { timeout })
                }
            }
        })
    }
}

impl<T, E> ExecutionPlan<T, E> for TimeoutPlan<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn execute(&self, invocation: Invocation<T, E>) -> PlanFuture<T, E> {
        if self.model.is_disabled() {
            return self.inner.execute(invocation);
        }

        // A timeout too large for the clock never fires.
        match Instant::now().checked_add(self.model.timeout()) {
            Some(deadline) => self.execute_by(invocation, deadline),
            None => self.inner.execute(invocation),
        }
    }
}
