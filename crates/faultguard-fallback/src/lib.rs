//! Fallback policy for faultguard.
//!
//! When the wrapped plan fails, a fallback produces the caller's result
//! instead. Which failures are handled is decided by kind:
//!
//! 1. `skip_on` matches: the failure propagates unchanged
//! 2. `apply_on` matches: the registered [`FallbackStrategy`] runs
//! 3. otherwise the failure propagates unchanged
//!
//! # Strategies
//!
//! - [`FallbackStrategy::value`]: return a fixed value
//! - [`FallbackStrategy::from_error`]: compute the result from the failure
//! - [`FallbackStrategy::handler`]: run an async handler that may itself fail
//!
//! # Examples
//!
//! ```
//! use faultguard_core::{invocation, ExecutionPlan, OperationId, Proceed};
//! use faultguard_fallback::{FallbackManager, FallbackMetadata, FallbackStrategy};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let manager = FallbackManager::new();
//! let operation = OperationId::new("app::Prices", "quote");
//! manager.register_handler(&operation, FallbackStrategy::<u32, std::io::Error>::value(0));
//!
//! let model = manager.get_or_create(&operation, &FallbackMetadata::new());
//! let plan = manager.plan::<u32, std::io::Error>(&operation, model, Proceed::shared()).unwrap();
//!
//! let price = plan
//!     .execute(invocation(|| async { Err(std::io::Error::other("offline")) }))
//!     .await
//!     .unwrap();
//! assert_eq!(price, 0);
//! # }
//! ```

mod config;
mod events;
mod manager;

pub use config::{FallbackMetadata, FallbackModel};
pub use events::FallbackEvent;
pub use manager::FallbackManager;

use faultguard_core::{
    Classify, EventListeners, ExecutionPlan, FaultToleranceError, Invocation, OperationId,
    PlanFuture, SharedPlan,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Function producing a fixed fallback value.
pub type ValueFn<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Function that computes a fallback result from the failure.
pub type FromErrorFn<T, E> = Arc<dyn Fn(&FaultToleranceError<E>) -> T + Send + Sync>;

/// Async handler called with the failure; it may fail in turn.
pub type HandlerFn<T, E> = Arc<
    dyn Fn(FaultToleranceError<E>) -> BoxFuture<'static, Result<T, FaultToleranceError<E>>>
        + Send
        + Sync,
>;

/// The strategy used to produce a fallback result.
pub enum FallbackStrategy<T, E> {
    /// Return a fixed value (cloned for each fallback).
    Value(ValueFn<T>),

    /// Compute a result from the failure.
    FromError(FromErrorFn<T, E>),

    /// Run an async handler.
    Handler(HandlerFn<T, E>),
}

impl<T, E> FallbackStrategy<T, E> {
    /// Returns `value` on every handled failure.
    pub fn value(value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self::Value(Arc::new(move || value.clone()))
    }

    /// Computes the result from the failure.
    pub fn from_error<F>(f: F) -> Self
    where
        F: Fn(&FaultToleranceError<E>) -> T + Send + Sync + 'static,
    {
        Self::FromError(Arc::new(f))
    }

    /// Runs `f` with the failure; an error from `f` is what the caller sees.
    pub fn handler<F, Fut>(f: F) -> Self
    where
        F: Fn(FaultToleranceError<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, FaultToleranceError<E>>> + Send + 'static,
    {
        Self::Handler(Arc::new(move |failure| f(failure).boxed()))
    }

    /// Short name used in events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::FromError(_) => "from_error",
            Self::Handler(_) => "handler",
        }
    }
}

impl<T, E> Clone for FallbackStrategy<T, E> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(f) => Self::Value(Arc::clone(f)),
            Self::FromError(f) => Self::FromError(Arc::clone(f)),
            Self::Handler(f) => Self::Handler(Arc::clone(f)),
        }
    }
}

impl<T, E> std::fmt::Debug for FallbackStrategy<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FallbackStrategy").field(&self.name()).finish()
    }
}

/// Execution plan that substitutes a fallback result for handled failures.
///
/// See the [module-level documentation](crate) for the decision order.
/// With a disabled model, set up through [`FallbackManager::plan`], every
/// failure propagates.
pub struct FallbackPlan<T, E> {
    operation: OperationId,
    model: Arc<FallbackModel>,
    strategy: FallbackStrategy<T, E>,
    listeners: Arc<EventListeners<FallbackEvent>>,
    inner: SharedPlan<T, E>,
}

impl<T, E> FallbackPlan<T, E> {
    /// Creates a plan applying `strategy` to failures of `inner`.
    pub fn new(
        operation: OperationId,
        model: Arc<FallbackModel>,
        strategy: FallbackStrategy<T, E>,
        listeners: Arc<EventListeners<FallbackEvent>>,
        inner: SharedPlan<T, E>,
    ) -> Self {
        Self {
            operation,
            model,
            strategy,
            listeners,
            inner,
        }
    }

    pub fn model(&self) -> &Arc<FallbackModel> {
        &self.model
    }
}

impl<T, E> ExecutionPlan<T, E> for FallbackPlan<T, E>
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
        let strategy = self.strategy.clone();
        let listeners = Arc::clone(&self.listeners);
        let call = self.inner.execute(invocation);

        Box::pin(async move {
            let failure = match call.await {
                Ok(value) => {
                    listeners.emit(&FallbackEvent::Success {
                        operation: operation.to_string(),
                        timestamp: Instant::now(),
                    });
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            if model.skip_on().matches(&failure) || !model.apply_on().matches(&failure) {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    operation = %operation,
                    kind = %failure.kind(),
                    "Failure not handled by fallback"
                );

                listeners.emit(&FallbackEvent::Skipped {
                    operation: operation.to_string(),
                    timestamp: Instant::now(),
                });
                return Err(failure);
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(
                operation = %operation,
                strategy = strategy.name(),
                "Applying fallback"
            );

            let result = match &strategy {
                FallbackStrategy::Value(f) => Ok(f()),
                FallbackStrategy::FromError(f) => Ok(f(&failure)),
                FallbackStrategy::Handler(f) => f(failure).await,
            };

            let event = match &result {
                Ok(_) => FallbackEvent::Applied {
                    operation: operation.to_string(),
                    timestamp: Instant::now(),
                    strategy: strategy.name(),
                },
                Err(_) => FallbackEvent::Failed {
                    operation: operation.to_string(),
                    timestamp: Instant::now(),
                },
            };
            listeners.emit(&event);

            result
        })
    }
}
