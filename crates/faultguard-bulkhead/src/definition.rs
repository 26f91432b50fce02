//! Bulkhead definitions and the fluent builder that registers them.

use crate::config::BulkheadMetadata;
use crate::manager::BulkheadManager;
use faultguard_core::DefinitionError;
use std::sync::Arc;

const POLICY: &str = "bulkhead";

/// Immutable description of a named bulkhead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkheadDefinition {
    name: String,
    max_concurrent_executions: usize,
    max_waiting_executions: usize,
    asynchronous: bool,
}

impl BulkheadDefinition {
    pub(crate) fn new(
        name: String,
        max_concurrent_executions: usize,
        max_waiting_executions: usize,
        asynchronous: bool,
    ) -> Result<Self, DefinitionError> {
        if max_concurrent_executions == 0 {
            return Err(DefinitionError::OutOfRange {
                policy: POLICY,
                field: "max_concurrency",
                reason: "must be at least 1",
            });
        }
        Ok(Self {
            name,
            max_concurrent_executions,
            max_waiting_executions,
            asynchronous,
        })
    }

    /// Validates `metadata` into a definition named `name`.
    pub fn from_metadata(
        name: impl Into<String>,
        metadata: &BulkheadMetadata,
    ) -> Result<Self, DefinitionError> {
        let max_concurrent = DefinitionError::non_negative(metadata.value, POLICY, "value")?;
        let max_waiting = DefinitionError::non_negative(
            metadata.waiting_task_queue,
            POLICY,
            "waiting_task_queue",
        )?;
        Self::new(
            name.into(),
            usize::try_from(max_concurrent).unwrap_or(usize::MAX),
            usize::try_from(max_waiting).unwrap_or(usize::MAX),
            metadata.asynchronous,
        )
    }

    /// Registry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum concurrent executions.
    pub fn max_concurrent_executions(&self) -> usize {
        self.max_concurrent_executions
    }

    /// Maximum executions waiting for a permit.
    pub fn max_waiting_executions(&self) -> usize {
        self.max_waiting_executions
    }

    /// Returns true if admitted work runs as a spawned task.
    pub fn is_asynchronous(&self) -> bool {
        self.asynchronous
    }
}

/// Fluent builder returned by [`BulkheadManager::new_bulkhead`].
///
/// [`build`](Self::build) consumes the builder, so each builder registers
/// at most one definition. To set the bulkhead of a guarded operation,
/// name it after the operation's key.
///
/// ```
/// use faultguard_bulkhead::BulkheadManager;
///
/// let manager = BulkheadManager::new();
/// let definition = manager
///     .new_bulkhead("inventory")
///     .with_max_concurrency(4)
///     .with_max_waiting(8)
///     .build()
///     .unwrap();
///
/// assert_eq!(definition.max_concurrent_executions(), 4);
/// assert!(manager.get_definition("inventory").is_some());
/// assert!(manager.new_bulkhead("inventory").build().is_err());
/// ```
#[must_use = "a bulkhead is only registered once `build` is called"]
pub struct BulkheadBuilder<'a> {
    manager: &'a BulkheadManager,
    name: String,
    max_concurrency: usize,
    max_waiting: usize,
    asynchronous: bool,
}

impl<'a> BulkheadBuilder<'a> {
    pub(crate) fn new(manager: &'a BulkheadManager, name: String) -> Self {
        Self {
            manager,
            name,
            max_concurrency: 10,
            max_waiting: 10,
            asynchronous: false,
        }
    }

    /// Sets the maximum concurrent executions.
    ///
    /// Default: 10
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Sets how many callers may wait for a permit.
    ///
    /// Default: 10
    pub fn with_max_waiting(mut self, max: usize) -> Self {
        self.max_waiting = max;
        self
    }

    /// Runs admitted work as a spawned task.
    pub fn asynchronous(mut self) -> Self {
        self.asynchronous = true;
        self
    }

    /// Validates the definition and registers it under its name.
    ///
    /// Fails with [`DefinitionError::DuplicateBulkhead`] if the name is taken.
    pub fn build(self) -> Result<Arc<BulkheadDefinition>, DefinitionError> {
        let definition = BulkheadDefinition::new(
            self.name,
            self.max_concurrency,
            self.max_waiting,
            self.asynchronous,
        )?;
        self.manager
            .register(definition)
            .map(|bulkhead| Arc::clone(bulkhead.definition()))
    }
}
