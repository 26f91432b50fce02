use crate::config::RetryMetadata;
use crate::events::RetryEvent;
use crate::model::RetryModel;
use crate::RetryPlan;
use faultguard_core::{Classify, DefinitionError, EventListeners, OperationId, SharedPlan};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Builds and caches one [`RetryModel`] per operation.
///
/// Models are derived purely from metadata, so concurrent first calls may
/// both build one; [`get_or_create`](Self::get_or_create) keeps whichever
/// was stored first.
#[derive(Debug, Default)]
pub struct RetryManager {
    models: RwLock<HashMap<OperationId, Arc<RetryModel>>>,
    listeners: Arc<EventListeners<RetryEvent>>,
}

impl RetryManager {
    /// Creates a manager with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager whose plans emit into `listeners`.
    pub fn with_listeners(listeners: EventListeners<RetryEvent>) -> Self {
        Self {
            models: RwLock::default(),
            listeners: Arc::new(listeners),
        }
    }

    /// Listeners every plan built by this manager emits into.
    pub fn listeners(&self) -> &EventListeners<RetryEvent> {
        &self.listeners
    }

    /// Returns the cached model for `operation`.
    pub fn get_retry_model(&self, operation: &OperationId) -> Option<Arc<RetryModel>> {
        self.models.read().get(operation).cloned()
    }

    /// Validates `metadata` and stores the model, replacing any previous one.
    pub fn create_retry_model(
        &self,
        operation: &OperationId,
        metadata: &RetryMetadata,
    ) -> Result<Arc<RetryModel>, DefinitionError> {
        let model = Arc::new(
            RetryModel::from_metadata(metadata).map_err(|e| e.in_operation(operation))?,
        );
        self.models
            .write()
            .insert(operation.clone(), Arc::clone(&model));

        #[cfg(feature = "tracing")]
        debug!(operation = %operation, max_retries = model.max_retries(), "Retry model created");

        Ok(model)
    }

    /// Returns the cached model, building it on first use.
    pub fn get_or_create(
        &self,
        operation: &OperationId,
        metadata: &RetryMetadata,
    ) -> Result<Arc<RetryModel>, DefinitionError> {
        if let Some(model) = self.get_retry_model(operation) {
            return Ok(model);
        }

        let model = Arc::new(
            RetryModel::from_metadata(metadata).map_err(|e| e.in_operation(operation))?,
        );
        let mut models = self.models.write();
        Ok(Arc::clone(models.entry(operation.clone()).or_insert(model)))
    }

    /// Wraps `inner` in a retry plan for `operation`.
    pub fn plan<T, E>(
        &self,
        operation: &OperationId,
        model: Arc<RetryModel>,
        inner: SharedPlan<T, E>,
    ) -> RetryPlan<T, E>
    where
        T: Send + 'static,
        E: Classify + Send + 'static,
    {
        RetryPlan::new(
            operation.clone(),
            model,
            Arc::clone(&self.listeners),
            inner,
        )
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
