//! Fallback models and the typed handler registry.

use crate::config::{FallbackMetadata, FallbackModel};
use crate::events::FallbackEvent;
use crate::{FallbackPlan, FallbackStrategy};
use faultguard_core::{Classify, DefinitionError, EventListeners, OperationId, SharedPlan};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

type AnyStrategy = Arc<dyn Any + Send + Sync>;

/// Caches fallback models and holds the registered fallback handlers.
///
/// Handlers are stored per operation with their result and error types
/// erased; [`handler`](Self::handler) recovers the typed strategy and reports
/// [`DefinitionError::PlanTypeMismatch`] if it was registered for other
/// types.
#[derive(Default)]
pub struct FallbackManager {
    models: RwLock<HashMap<OperationId, Arc<FallbackModel>>>,
    handlers: RwLock<HashMap<OperationId, AnyStrategy>>,
    listeners: Arc<EventListeners<FallbackEvent>>,
}

impl std::fmt::Debug for FallbackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackManager")
            .field("models", &self.models.read().len())
            .field("handlers", &self.handlers.read().len())
            .finish()
    }
}

impl FallbackManager {
    /// Creates a manager with no handlers or listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager whose plans emit into `listeners`.
    pub fn with_listeners(listeners: EventListeners<FallbackEvent>) -> Self {
        Self {
            models: RwLock::default(),
            handlers: RwLock::default(),
            listeners: Arc::new(listeners),
        }
    }

    /// Registers the fallback for `operation`, replacing any previous one.
    pub fn register_handler<T, E>(&self, operation: &OperationId, strategy: FallbackStrategy<T, E>)
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        #[cfg(feature = "tracing")]
        tracing::debug!(operation = %operation, strategy = strategy.name(), "Fallback handler registered");

        self.handlers
            .write()
            .insert(operation.clone(), Arc::new(strategy));
    }

    /// Returns true if a handler is registered for `operation`, whatever its
    /// types.
    pub fn has_handler(&self, operation: &OperationId) -> bool {
        self.handlers.read().contains_key(operation)
    }

    /// Returns the handler registered for `operation`.
    pub fn handler<T, E>(
        &self,
        operation: &OperationId,
    ) -> Result<FallbackStrategy<T, E>, DefinitionError>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        let handlers = self.handlers.read();
        let stored = handlers
            .get(operation)
            .ok_or_else(|| DefinitionError::MissingFallbackHandler {
                operation: operation.clone(),
            })?;
        stored
            .downcast_ref::<FallbackStrategy<T, E>>()
            .cloned()
            .ok_or_else(|| DefinitionError::PlanTypeMismatch {
                operation: operation.clone(),
            })
    }

    /// Returns the cached model for `operation`.
    pub fn get_fallback_model(&self, operation: &OperationId) -> Option<Arc<FallbackModel>> {
        self.models.read().get(operation).cloned()
    }

    /// Stores the model for `operation`, replacing any previous one.
    pub fn create_fallback_model(
        &self,
        operation: &OperationId,
        metadata: &FallbackMetadata,
    ) -> Arc<FallbackModel> {
        let model = Arc::new(FallbackModel::from_metadata(metadata));
        self.models
            .write()
            .insert(operation.clone(), Arc::clone(&model));
        model
    }

    /// Returns the cached model, building it on first use.
    pub fn get_or_create(
        &self,
        operation: &OperationId,
        metadata: &FallbackMetadata,
    ) -> Arc<FallbackModel> {
        if let Some(model) = self.get_fallback_model(operation) {
            return model;
        }
        let model = Arc::new(FallbackModel::from_metadata(metadata));
        let mut models = self.models.write();
        Arc::clone(models.entry(operation.clone()).or_insert(model))
    }

    /// Wraps `inner` in a fallback plan using the handler registered for
    /// `operation`.
    pub fn plan<T, E>(
        &self,
        operation: &OperationId,
        model: Arc<FallbackModel>,
        inner: SharedPlan<T, E>,
    ) -> Result<FallbackPlan<T, E>, DefinitionError>
    where
        T: Send + 'static,
        E: Classify + Send + 'static,
    {
        let strategy = self
            .handler::<T, E>(operation)
            .map_err(|e| e.in_operation(operation))?;
        Ok(FallbackPlan::new(
            operation.clone(),
            model,
            strategy,
            Arc::clone(&self.listeners),
            inner,
        ))
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
