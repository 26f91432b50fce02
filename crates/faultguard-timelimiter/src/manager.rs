use crate::config::TimeoutMetadata;
use crate::events::TimeoutEvent;
use crate::model::TimeoutModel;
use crate::TimeoutPlan;
use faultguard_core::{DefinitionError, EventListeners, OperationId, SharedPlan};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Builds and caches one [`TimeoutModel`] per operation.
#[derive(Debug, Default)]
pub struct TimeoutManager {
    models: RwLock<HashMap<OperationId, Arc<TimeoutModel>>>,
    listeners: Arc<EventListeners<TimeoutEvent>>,
}

impl TimeoutManager {
    /// Creates a manager with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager whose plans emit into `listeners`.
    pub fn with_listeners(listeners: EventListeners<TimeoutEvent>) -> Self {
        Self {
            models: RwLock::default(),
            listeners: Arc::new(listeners),
        }
    }

    /// Returns the cached model for `operation`.
    pub fn get_timeout_model(&self, operation: &OperationId) -> Option<Arc<TimeoutModel>> {
        self.models.read().get(operation).cloned()
    }

    /// Validates `metadata` and stores the model, replacing any previous one.
    pub fn create_timeout_model(
        &self,
        operation: &OperationId,
        metadata: &TimeoutMetadata,
    ) -> Result<Arc<TimeoutModel>, DefinitionError> {
        let model = Arc::new(
            TimeoutModel::from_metadata(metadata).map_err(|e| e.in_operation(operation))?,
        );
        self.models
            .write()
            .insert(operation.clone(), Arc::clone(&model));

        #[cfg(feature = "tracing")]
        debug!(
            operation = %operation,
            timeout_ms = model.timeout().as_millis(),
            "Timeout model created"
        );

        Ok(model)
    }

    /// Returns the cached model, building it on first use.
    pub fn get_or_create(
        &self,
        operation: &OperationId,
        metadata: &TimeoutMetadata,
    ) -> Result<Arc<TimeoutModel>, DefinitionError> {
        if let Some(model) = self.get_timeout_model(operation) {
            return Ok(model);
        }

        let model = Arc::new(
            TimeoutModel::from_metadata(metadata).map_err(|e| e.in_operation(operation))?,
        );
        let mut models = self.models.write();
        Ok(Arc::clone(models.entry(operation.clone()).or_insert(model)))
    }

    /// Wraps `inner` in a timeout plan for `operation`.
    pub fn plan<T, E>(
        &self,
        operation: &OperationId,
        model: Arc<TimeoutModel>,
        inner: SharedPlan<T, E>,
    ) -> TimeoutPlan<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        TimeoutPlan::new(operation.clone(), model, Arc::clone(&self.listeners), inner)
    }

    /// Number of cached models.
    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    /// Returns true if no model is cached.
    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }
}
