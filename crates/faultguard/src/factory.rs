//! Builds composed execution plans from operation metadata.

use crate::bulkhead::{Bulkhead, BulkheadManager};
use crate::circuitbreaker::{CircuitBreaker, CircuitBreakerManager};
use crate::fallback::{FallbackManager, FallbackModel};
use crate::metadata::OperationMetadata;
use crate::retry::{RetryManager, RetryModel};
use crate::timelimiter::{TimeoutManager, TimeoutModel};
use faultguard_core::{Classify, DefinitionError, OperationId, Proceed, SharedPlan};
use std::sync::Arc;

/// Policy models resolved for one operation.
struct Policies {
    retry: Option<Arc<RetryModel>>,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
    timeout: Option<Arc<TimeoutModel>>,
    bulkhead: Option<Arc<Bulkhead>>,
    fallback: Option<Arc<FallbackModel>>,
}

/// Composes policy plans for an operation.
///
/// Plans nest in a fixed order, outermost first:
///
/// ```text
/// Fallback -> Retry -> CircuitBreaker -> Timeout -> Bulkhead -> call
/// ```
///
/// so each retry attempt passes through the circuit breaker, each attempt
/// is timed on its own, and bulkhead admission is requested per attempt.
/// Policies that are absent or disabled are left out of the chain.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlanFactory {
    retry: Arc<RetryManager>,
    circuit_breaker: Arc<CircuitBreakerManager>,
    timeout: Arc<TimeoutManager>,
    bulkhead: Arc<BulkheadManager>,
    fallback: Arc<FallbackManager>,
}

impl ExecutionPlanFactory {
    /// Creates a factory over fresh, empty managers.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry_manager(mut self, manager: Arc<RetryManager>) -> Self {
        self.retry = manager;
        self
    }

    pub fn with_circuit_breaker_manager(mut self, manager: Arc<CircuitBreakerManager>) -> Self {
        self.circuit_breaker = manager;
        self
    }

    pub fn with_timeout_manager(mut self, manager: Arc<TimeoutManager>) -> Self {
        self.timeout = manager;
        self
    }

    pub fn with_bulkhead_manager(mut self, manager: Arc<BulkheadManager>) -> Self {
        self.bulkhead = manager;
        self
    }

    pub fn with_fallback_manager(mut self, manager: Arc<FallbackManager>) -> Self {
        self.fallback = manager;
        self
    }

    pub fn retry_manager(&self) -> &Arc<RetryManager> {
        &self.retry
    }

    pub fn circuit_breaker_manager(&self) -> &Arc<CircuitBreakerManager> {
        &self.circuit_breaker
    }

    pub fn timeout_manager(&self) -> &Arc<TimeoutManager> {
        &self.timeout
    }

    pub fn bulkhead_manager(&self) -> &Arc<BulkheadManager> {
        &self.bulkhead
    }

    pub fn fallback_manager(&self) -> &Arc<FallbackManager> {
        &self.fallback
    }

    /// Builds every declared policy model, reporting the first invalid one.
    ///
    /// Valid models are cached by their managers as a side effect, so a later
    /// [`build_plan`](Self::build_plan) reuses them.
    pub fn validate(
        &self,
        operation: &OperationId,
        metadata: &OperationMetadata,
    ) -> Result<(), DefinitionError> {
        self.resolve(operation, metadata).map(|_| ())
    }

    /// Builds the composed plan for `operation`.
    pub fn build_plan<T, E>(
        &self,
        operation: &OperationId,
        metadata: &OperationMetadata,
    ) -> Result<SharedPlan<T, E>, DefinitionError>
    where
        T: Send + 'static,
        E: Classify + Send + 'static,
    {
        let policies = self.resolve(operation, metadata)?;
        let mut plan: SharedPlan<T, E> = Proceed::shared();

        if let Some(bulkhead) = policies.bulkhead {
            plan = Arc::new(self.bulkhead.plan(bulkhead, plan));
        }
        if let Some(model) = policies.timeout {
            plan = Arc::new(self.timeout.plan(operation, model, plan));
        }
        if let Some(circuit) = policies.circuit_breaker {
            plan = Arc::new(self.circuit_breaker.plan(circuit, plan));
        }
        if let Some(model) = policies.retry {
            plan = Arc::new(self.retry.plan(operation, model, plan));
        }
        if let Some(model) = policies.fallback {
            plan = Arc::new(self.fallback.plan(operation, model, plan)?);
        }

        Ok(plan)
    }

    fn resolve(
        &self,
        operation: &OperationId,
        metadata: &OperationMetadata,
    ) -> Result<Policies, DefinitionError> {
        let retry = metadata
            .retry()
            .map(|m| self.retry.get_or_create(operation, m))
            .transpose()?;
        let circuit_breaker = metadata
            .circuit_breaker()
            .map(|m| self.circuit_breaker.get_or_create(operation, m))
            .transpose()?;
        let timeout = metadata
            .timeout()
            .map(|m| self.timeout.get_or_create(operation, m))
            .transpose()?;
        let bulkhead = metadata
            .bulkhead()
            .map(|m| self.bulkhead.get_or_create(operation, m))
            .transpose()?;
        let fallback = match metadata.fallback() {
            Some(m) => {
                if !self.fallback.has_handler(operation) {
                    return Err(DefinitionError::MissingFallbackHandler {
                        operation: operation.clone(),
                    }
                    .in_operation(operation));
                }
                Some(self.fallback.get_or_create(operation, m))
            }
            None => None,
        };

        Ok(Policies {
            retry,
            circuit_breaker,
            timeout,
            bulkhead,
            fallback,
        })
    }
}
