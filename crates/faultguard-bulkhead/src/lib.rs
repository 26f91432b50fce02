//! Bulkhead policy for faultguard.
//!
//! A bulkhead bounds how many executions of a guarded operation run at
//! once. An arriving call takes one of `max_concurrent_executions` permits;
//! if none is free it waits in a queue of at most `max_waiting_executions`
//! callers; beyond that it is rejected at once with
//! [`FaultToleranceError::BulkheadFull`].
//!
//! Two execution modes exist:
//!
//! - **synchronous** (default): the caller's own future waits for the
//!   permit and runs the call
//! - **asynchronous**: admission is decided when the call arrives, then the
//!   work is spawned onto the tokio runtime and the caller awaits its
//!   result. Dropping the caller's future does not cancel spawned work.
//!
//! # Registering bulkheads
//!
//! ```
//! use faultguard_bulkhead::BulkheadManager;
//!
//! let manager = BulkheadManager::new();
//! let definition = manager
//!     .new_bulkhead("payments")
//!     .with_max_concurrency(2)
//!     .with_max_waiting(0)
//!     .asynchronous()
//!     .build()
//!     .unwrap();
//! assert!(definition.is_asynchronous());
//! ```
//!
//! # Guarding a call
//!
//! ```
//! use faultguard_bulkhead::{BulkheadManager, BulkheadMetadata};
//! use faultguard_core::{invocation, ExecutionPlan, OperationId, Proceed};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let manager = BulkheadManager::new();
//! let operation = OperationId::new("app::Payments", "charge");
//! let bulkhead = manager
//!     .get_or_create(&operation, &BulkheadMetadata::new().with_value(4))
//!     .unwrap();
//! let plan = manager.plan(bulkhead, Proceed::shared());
//!
//! let result = plan
//!     .execute(invocation(|| async { Ok::<_, std::io::Error>("charged") }))
//!     .await;
//! assert_eq!(result.unwrap(), "charged");
//! # }
//! ```

mod bulkhead;
mod config;
mod definition;
mod events;
mod manager;

pub use bulkhead::Bulkhead;
pub use config::BulkheadMetadata;
pub use definition::{BulkheadBuilder, BulkheadDefinition};
pub use events::BulkheadEvent;
pub use manager::BulkheadManager;

use bulkhead::Admission;
use faultguard_core::{ExecutionPlan, FaultToleranceError, Invocation, PlanFuture, SharedPlan};
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Execution plan admitting calls through a [`Bulkhead`].
pub struct BulkheadPlan<T, E> {
    bulkhead: Arc<Bulkhead>,
    inner: SharedPlan<T, E>,
}

impl<T, E> BulkheadPlan<T, E> {
    /// Creates a plan admitting calls to `inner` through `bulkhead`.
    pub fn new(bulkhead: Arc<Bulkhead>, inner: SharedPlan<T, E>) -> Self {
        Self { bulkhead, inner }
    }

    /// The permit pool this plan admits through.
    pub fn bulkhead(&self) -> &Arc<Bulkhead> {
        &self.bulkhead
    }
}

fn rejection<E>(bulkhead: &Bulkhead) -> FaultToleranceError<E> {
    let definition = bulkhead.definition();
    FaultToleranceError::BulkheadFull {
        bulkhead: definition.name().to_string(),
        max_concurrent: definition.max_concurrent_executions(),
        max_waiting: definition.max_waiting_executions(),
    }
}

async fn run_admitted<T, E>(
    bulkhead: Arc<Bulkhead>,
    admission: Admission,
    inner: SharedPlan<T, E>,
    invocation: Invocation<T, E>,
) -> Result<T, FaultToleranceError<E>> {
    let permit = admission
        .into_permit()
        .await
        .ok_or(FaultToleranceError::Interrupted)?;

    let start = Instant::now();
    let result = inner.execute(invocation).await;
    drop(permit);

    let duration = start.elapsed();
    let event = match &result {
        Ok(_) => BulkheadEvent::CallFinished {
            bulkhead: bulkhead.name().to_string(),
            timestamp: Instant::now(),
            duration,
        },
        Err(_) => BulkheadEvent::CallFailed {
            bulkhead: bulkhead.name().to_string(),
            timestamp: Instant::now(),
            duration,
        },
    };
    bulkhead.listeners().emit(&event);

    result
}

impl<T, E> ExecutionPlan<T, E> for BulkheadPlan<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn execute(&self, invocation: Invocation<T, E>) -> PlanFuture<T, E> {
        let bulkhead = Arc::clone(&self.bulkhead);
        let inner = Arc::clone(&self.inner);

        Box::pin(async move {
            let Some(admission) = bulkhead.try_admit() else {
                #[cfg(feature = "tracing")]
                debug!(
                    bulkhead = bulkhead.name(),
                    max_concurrent = bulkhead.definition().max_concurrent_executions(),
                    "Call rejected by bulkhead"
                );

                return Err(rejection(&bulkhead));
            };

            if !bulkhead.definition().is_asynchronous() {
                return run_admitted(bulkhead, admission, inner, invocation).await;
            }

            let task = tokio::spawn(run_admitted(
                Arc::clone(&bulkhead),
                admission,
                inner,
                invocation,
            ));
            match task.await {
                Ok(result) => result,
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    debug!(bulkhead = bulkhead.name(), "Queued execution was cancelled");

                    Err(FaultToleranceError::Interrupted)
                }
            }
        })
    }
}
