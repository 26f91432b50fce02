//! Declarative bulkhead metadata.

/// Bulkhead metadata attached to an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BulkheadMetadata {
    /// Maximum concurrent executions. Default: 10
    pub value: i64,
    /// Maximum executions waiting for a permit. Default: 10
    pub waiting_task_queue: i64,
    /// Run admitted work as a spawned task instead of in the caller. Default: false
    pub asynchronous: bool,
    /// Whether the policy applies at all. Default: true
    pub enabled: bool,
}

impl Default for BulkheadMetadata {
    fn default() -> Self {
        Self {
            value: 10,
            waiting_task_queue: 10,
            asynchronous: false,
            enabled: true,
        }
    }
}

impl BulkheadMetadata {
    /// Creates metadata with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum concurrent executions.
    pub fn with_value(mut self, value: i64) -> Self {
        self.value = value;
        self
    }

    /// Sets the waiting queue capacity.
    pub fn with_waiting_task_queue(mut self, waiting: i64) -> Self {
        self.waiting_task_queue = waiting;
        self
    }

    /// Selects the asynchronous execution mode.
    pub fn with_asynchronous(mut self, asynchronous: bool) -> Self {
        self.asynchronous = asynchronous;
        self
    }

    /// Enables or disables the policy.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
