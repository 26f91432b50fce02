//! Name-keyed bulkhead registry.

use crate::bulkhead::Bulkhead;
use crate::config::BulkheadMetadata;
use crate::definition::{BulkheadBuilder, BulkheadDefinition};
use crate::events::BulkheadEvent;
use crate::BulkheadPlan;
use faultguard_core::{DefinitionError, EventListeners, OperationId, SharedPlan};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Registry of named bulkheads and their permit pools.
///
/// Bulkheads are registered either explicitly through
/// [`new_bulkhead`](Self::new_bulkhead) or, for operations carrying
/// [`BulkheadMetadata`], under the operation's key on first use.
///
/// Guarded operations look their bulkhead up by [`OperationId::as_str`].
/// A bulkhead built under that key before the first call is the one the
/// operation uses, and its metadata is then ignored.
#[derive(Debug, Default)]
pub struct BulkheadManager {
    bulkheads: RwLock<HashMap<String, Arc<Bulkhead>>>,
    listeners: Arc<EventListeners<BulkheadEvent>>,
}

impl BulkheadManager {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry whose bulkheads emit into `listeners`.
    pub fn with_listeners(listeners: EventListeners<BulkheadEvent>) -> Self {
        Self {
            bulkheads: RwLock::default(),
            listeners: Arc::new(listeners),
        }
    }

    /// Starts building a bulkhead named `name`.
    pub fn new_bulkhead(&self, name: impl Into<String>) -> BulkheadBuilder<'_> {
        BulkheadBuilder::new(self, name.into())
    }

    pub(crate) fn register(
        &self,
        definition: BulkheadDefinition,
    ) -> Result<Arc<Bulkhead>, DefinitionError> {
        let mut bulkheads = self.bulkheads.write();
        if bulkheads.contains_key(definition.name()) {
            return Err(DefinitionError::DuplicateBulkhead {
                name: definition.name().to_string(),
            });
        }

        #[cfg(feature = "tracing")]
        debug!(
            bulkhead = definition.name(),
            max_concurrent = definition.max_concurrent_executions(),
            max_waiting = definition.max_waiting_executions(),
            asynchronous = definition.is_asynchronous(),
            "Bulkhead registered"
        );

        let name = definition.name().to_string();
        let bulkhead = Arc::new(Bulkhead::new(definition, Arc::clone(&self.listeners)));
        bulkheads.insert(name, Arc::clone(&bulkhead));
        Ok(bulkhead)
    }

    /// Returns the definition registered under `name`.
    pub fn get_definition(&self, name: &str) -> Option<Arc<BulkheadDefinition>> {
        self.bulkheads
            .read()
            .get(name)
            .map(|bulkhead| Arc::clone(bulkhead.definition()))
    }

    /// Returns the permit pool registered under `name`.
    pub fn get_bulkhead(&self, name: &str) -> Option<Arc<Bulkhead>> {
        self.bulkheads.read().get(name).cloned()
    }

    /// Returns the bulkhead for `operation`, registering it from `metadata`
    /// on first use.
    pub fn get_or_create(
        &self,
        operation: &OperationId,
        metadata: &BulkheadMetadata,
    ) -> Result<Arc<Bulkhead>, DefinitionError> {
        if let Some(bulkhead) = self.get_bulkhead(operation.as_str()) {
            return Ok(bulkhead);
        }

        let definition = BulkheadDefinition::from_metadata(operation.as_str(), metadata)
            .map_err(|e| e.in_operation(operation))?;
        let mut bulkheads = self.bulkheads.write();
        let bulkhead = bulkheads
            .entry(operation.as_str().to_string())
            .or_insert_with(|| Arc::new(Bulkhead::new(definition, Arc::clone(&self.listeners))));
        Ok(Arc::clone(bulkhead))
    }

    /// Wraps `inner` in a plan admitted through `bulkhead`.
    pub fn plan<T, E>(&self, bulkhead: Arc<Bulkhead>, inner: SharedPlan<T, E>) -> BulkheadPlan<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        BulkheadPlan::new(bulkhead, inner)
    }

    /// Number of registered bulkheads.
    pub fn len(&self) -> usize {
        self.bulkheads.read().len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.bulkheads.read().is_empty()
    }
}
