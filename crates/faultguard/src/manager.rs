//! The engine entry point: plan cache plus execution.

use crate::bulkhead::BulkheadManager;
use crate::circuitbreaker::CircuitBreakerManager;
use crate::factory::ExecutionPlanFactory;
use crate::fallback::FallbackManager;
use crate::metadata::OperationMetadata;
use crate::retry::RetryManager;
use crate::timelimiter::TimeoutManager;
use faultguard_core::{
    Classify, DefinitionError, ExecutionPlan, FaultToleranceError, Invocation, OperationId,
    Proceed, SharedPlan,
};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::debug;

type AnyPlan = Arc<dyn Any + Send + Sync>;

/// Runs guarded operations through cached execution plans.
///
/// The first call to an operation builds its plan from the operation's
/// metadata; later calls reuse it. If two callers build concurrently, the
/// plan stored first is the one both use. Invalid metadata is reported to
/// the caller as [`FaultToleranceError::Definition`] and nothing is cached,
/// so every call re-reports it.
///
/// ```
/// use faultguard::{ExecutionManager, OperationMetadata, RetryMetadata};
/// use faultguard_core::{invocation, DurationUnit, OperationId};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let manager = ExecutionManager::builder().build();
/// let operation = OperationId::new("app::Weather", "forecast");
/// let metadata = OperationMetadata::new()
///     .with_retry(RetryMetadata::new().with_jitter(0, DurationUnit::Millis));
///
/// let forecast = manager
///     .execute(&operation, &metadata, invocation(|| async {
///         Ok::<_, std::io::Error>("sunny")
///     }))
///     .await
///     .unwrap();
/// assert_eq!(forecast, "sunny");
/// assert!(manager.contains_plan(&operation));
/// # }
/// ```
#[derive(Debug)]
pub struct ExecutionManager {
    factory: ExecutionPlanFactory,
    plans: RwLock<HashMap<OperationId, AnyPlan>>,
}

impl ExecutionManager {
    /// Creates a manager building plans with `factory`.
    pub fn new(factory: ExecutionPlanFactory) -> Self {
        Self {
            factory,
            plans: RwLock::default(),
        }
    }

    /// Starts wiring a manager; managers not supplied are created empty.
    pub fn builder() -> ExecutionManagerBuilder {
        ExecutionManagerBuilder::default()
    }

    pub fn factory(&self) -> &ExecutionPlanFactory {
        &self.factory
    }

    /// Runs `invocation` under the policies in `metadata`.
    ///
    /// Operations without any enabled policy bypass the engine: the call
    /// runs once and its error is wrapped as
    /// [`FaultToleranceError::Operation`].
    pub async fn execute<T, E>(
        &self,
        operation: &OperationId,
        metadata: &OperationMetadata,
        invocation: Invocation<T, E>,
    ) -> Result<T, FaultToleranceError<E>>
    where
        T: Send + 'static,
        E: Classify + Send + 'static,
    {
        if !metadata.is_guarded() {
            return Proceed.execute(invocation).await;
        }

        let plan = self.plan::<T, E>(operation, metadata)?;
        plan.execute(invocation).await
    }

    /// Returns the cached plan for `operation`, building it on a miss.
    ///
    /// Fails with [`DefinitionError::PlanTypeMismatch`] if the identity is
    /// already cached with another result or error type.
    pub fn plan<T, E>(
        &self,
        operation: &OperationId,
        metadata: &OperationMetadata,
    ) -> Result<SharedPlan<T, E>, DefinitionError>
    where
        T: Send + 'static,
        E: Classify + Send + 'static,
    {
        if let Some(cached) = self.plans.read().get(operation) {
            return downcast(operation, cached);
        }

        let built: AnyPlan = Arc::new(self.factory.build_plan::<T, E>(operation, metadata)?);

        #[cfg(feature = "tracing")]
        debug!(operation = %operation, "Execution plan built");

        let mut plans = self.plans.write();
        let cached = plans.entry(operation.clone()).or_insert(built);
        downcast(operation, cached)
    }

    /// Deployment-time check of one operation's metadata.
    ///
    /// Builds every declared policy model without running anything.
    pub fn validate(
        &self,
        operation: &OperationId,
        metadata: &OperationMetadata,
    ) -> Result<(), DefinitionError> {
        self.factory
            .validate(operation, metadata)
            .map_err(|e| e.in_operation(operation))
    }

    /// Validates every operation, collecting all problems.
    pub fn validate_all<'a, I>(&self, operations: I) -> Result<(), Vec<DefinitionError>>
    where
        I: IntoIterator<Item = (&'a OperationId, &'a OperationMetadata)>,
    {
        let problems: Vec<_> = operations
            .into_iter()
            .filter_map(|(operation, metadata)| self.validate(operation, metadata).err())
            .collect();

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    /// Number of cached plans.
    pub fn plan_count(&self) -> usize {
        self.plans.read().len()
    }

    /// Returns true if a plan is cached for `operation`.
    pub fn contains_plan(&self, operation: &OperationId) -> bool {
        self.plans.read().contains_key(operation)
    }
}

fn downcast<T, E>(operation: &OperationId, cached: &AnyPlan) -> Result<SharedPlan<T, E>, DefinitionError>
where
    T: 'static,
    E: 'static,
{
    cached
        .downcast_ref::<SharedPlan<T, E>>()
        .cloned()
        .ok_or_else(|| DefinitionError::PlanTypeMismatch {
            operation: operation.clone(),
        })
}

/// Wires policy managers into an [`ExecutionManager`].
#[derive(Debug, Default)]
#[must_use]
pub struct ExecutionManagerBuilder {
    factory: ExecutionPlanFactory,
}

impl ExecutionManagerBuilder {
    pub fn retry_manager(mut self, manager: Arc<RetryManager>) -> Self {
        self.factory = self.factory.with_retry_manager(manager);
        self
    }

    pub fn circuit_breaker_manager(mut self, manager: Arc<CircuitBreakerManager>) -> Self {
        self.factory = self.factory.with_circuit_breaker_manager(manager);
        self
    }

    pub fn timeout_manager(mut self, manager: Arc<TimeoutManager>) -> Self {
        self.factory = self.factory.with_timeout_manager(manager);
        self
    }

    pub fn bulkhead_manager(mut self, manager: Arc<BulkheadManager>) -> Self {
        self.factory = self.factory.with_bulkhead_manager(manager);
        self
    }

    pub fn fallback_manager(mut self, manager: Arc<FallbackManager>) -> Self {
        self.factory = self.factory.with_fallback_manager(manager);
        self
    }

    pub fn build(self) -> ExecutionManager {
        ExecutionManager::new(self.factory)
    }
}
