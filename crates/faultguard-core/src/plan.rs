//! The execution plan contract.
//!
//! An [`ExecutionPlan`] wraps a call with one policy. Plans are built once
//! per operation, cached, and then shared by every concurrent caller, so
//! they hold configuration only: anything mutable that belongs to one
//! logical call lives inside the future returned by
//! [`execute`](ExecutionPlan::execute).
//!
//! Composition is plain nesting. Each policy plan owns the next plan inward
//! as a [`SharedPlan`], and the innermost one is [`Proceed`], which invokes
//! the underlying call.
//!
//! ```
//! use faultguard_core::{invocation, ExecutionPlan, Proceed};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let call = invocation(|| async { Ok::<_, std::io::Error>(42) });
//! let result = Proceed.execute(call).await;
//! assert_eq!(result.unwrap(), 42);
//! # }
//! ```

use crate::error::FaultToleranceError;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;

/// A re-invocable handle to the underlying call.
///
/// Every invocation produces a fresh future, so retrying plans can call it
/// once per attempt.
pub type Invocation<T, E> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Future returned by [`ExecutionPlan::execute`].
pub type PlanFuture<T, E> = BoxFuture<'static, Result<T, FaultToleranceError<E>>>;

/// A plan shared between the cache and every caller.
pub type SharedPlan<T, E> = Arc<dyn ExecutionPlan<T, E>>;

/// Runs a call under one policy.
///
/// Implementations must be safe to execute concurrently and must not change
/// the success type of the call; they may only delay, repeat, reject or
/// substitute its outcome.
pub trait ExecutionPlan<T, E>: Send + Sync {
    /// Executes `invocation` under this plan's policy.
    fn execute(&self, invocation: Invocation<T, E>) -> PlanFuture<T, E>;
}

impl<T, E, P> ExecutionPlan<T, E> for Arc<P>
where
    P: ExecutionPlan<T, E> + ?Sized,
{
    fn execute(&self, invocation: Invocation<T, E>) -> PlanFuture<T, E> {
        (**self).execute(invocation)
    }
}

/// Wraps an async closure as an [`Invocation`].
pub fn invocation<T, E, F, Fut>(f: F) -> Invocation<T, E>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// The innermost plan: invokes the underlying call exactly once.
#[derive(Debug, Clone, Copy, Default)]
pub struct Proceed;

impl Proceed {
    /// Returns the plan as a [`SharedPlan`].
    pub fn shared<T, E>() -> SharedPlan<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        Arc::new(Proceed)
    }
}

impl<T, E> ExecutionPlan<T, E> for Proceed
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn execute(&self, invocation: Invocation<T, E>) -> PlanFuture<T, E> {
        Box::pin(async move { invocation().await.map_err(FaultToleranceError::Operation) })
    }
}
