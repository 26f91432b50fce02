use crate::circuit::{CircuitBreaker, CircuitState};
use crate::config::CircuitBreakerMetadata;
use crate::events::CircuitBreakerEvent;
use crate::model::CircuitBreakerModel;
use crate::CircuitBreakerPlan;
use faultguard_core::{Classify, DefinitionError, EventListeners, OperationId, SharedPlan};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Owns one [`CircuitBreaker`] per operation.
///
/// Unlike retry models, a circuit carries state shared by every call to the
/// operation, so the first circuit stored for an operation is the one all
/// plans for it use.
#[derive(Debug, Default)]
pub struct CircuitBreakerManager {
    circuits: RwLock<HashMap<OperationId, Arc<CircuitBreaker>>>,
    listeners: Arc<EventListeners<CircuitBreakerEvent>>,
}

impl CircuitBreakerManager {
    /// Creates a manager with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager whose circuits emit into `listeners`.
    pub fn with_listeners(listeners: EventListeners<CircuitBreakerEvent>) -> Self {
        Self {
            circuits: RwLock::default(),
            listeners: Arc::new(listeners),
        }
    }

    /// Returns the model of the circuit for `operation`.
    pub fn get_circuit_breaker_model(
        &self,
        operation: &OperationId,
    ) -> Option<Arc<CircuitBreakerModel>> {
        self.circuits
            .read()
            .get(operation)
            .map(|circuit| Arc::clone(circuit.model()))
    }

    /// Validates `metadata` and installs a fresh, closed circuit for
    /// `operation`, replacing any previous one.
    pub fn create_circuit_breaker_model(
        &self,
        operation: &OperationId,
        metadata: &CircuitBreakerMetadata,
    ) -> Result<Arc<CircuitBreakerModel>, DefinitionError> {
        let circuit = self.build(operation, metadata)?;
        let model = Arc::clone(circuit.model());
        self.circuits.write().insert(operation.clone(), circuit);
        Ok(model)
    }

    /// Returns the circuit for `operation`, creating it on first use.
    pub fn get_or_create(
        &self,
        operation: &OperationId,
        metadata: &CircuitBreakerMetadata,
    ) -> Result<Arc<CircuitBreaker>, DefinitionError> {
        if let Some(circuit) = self.circuit(operation) {
            return Ok(circuit);
        }

        let circuit = self.build(operation, metadata)?;
        let mut circuits = self.circuits.write();
        Ok(Arc::clone(circuits.entry(operation.clone()).or_insert(circuit)))
    }

    /// Returns the circuit for `operation`.
    pub fn circuit(&self, operation: &OperationId) -> Option<Arc<CircuitBreaker>> {
        self.circuits.read().get(operation).cloned()
    }

    /// Returns the current state of the circuit for `operation`.
    pub fn state(&self, operation: &OperationId) -> Option<CircuitState> {
        self.circuits.read().get(operation).map(|circuit| circuit.state())
    }

    /// Wraps `inner` in a plan guarded by `circuit`.
    pub fn plan<T, E>(
        &self,
        circuit: Arc<CircuitBreaker>,
        inner: SharedPlan<T, E>,
    ) -> CircuitBreakerPlan<T, E>
    where
        T: Send + 'static,
        E: Classify + Send + 'static,
    {
        CircuitBreakerPlan::new(circuit, inner)
    }

    /// Number of circuits.
    pub fn len(&self) -> usize {
        self.circuits.read().len()
    }

    /// Returns true if no circuit exists.
    pub fn is_empty(&self) -> bool {
        self.circuits.read().is_empty()
    }

    fn build(
        &self,
        operation: &OperationId,
        metadata: &CircuitBreakerMetadata,
    ) -> Result<Arc<CircuitBreaker>, DefinitionError> {
        let model = CircuitBreakerModel::from_metadata(metadata)
            .map_err(|e| e.in_operation(operation))?;

        #[cfg(feature = "tracing")]
        debug!(
            operation = %operation,
            window = model.request_volume_threshold(),
            failure_ratio = model.failure_ratio(),
            "Circuit breaker created"
        );

        Ok(Arc::new(CircuitBreaker::new(
            operation.clone(),
            Arc::new(model),
            Arc::clone(&self.listeners),
        )))
    }
}
