use faultguard_core::DurationUnit;

/// Declarative timeout metadata attached to an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimeoutMetadata {
    /// Time allowed for one call. Default: 1000
    pub value: i64,
    /// Unit of `value`. Default: milliseconds
    pub unit: DurationUnit,
    /// Whether the policy applies at all. Default: true
    pub enabled: bool,
}

impl Default for TimeoutMetadata {
    fn default() -> Self {
        Self {
            value: 1000,
            unit: DurationUnit::Millis,
            enabled: true,
        }
    }
}

impl TimeoutMetadata {
    /// Creates metadata with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time allowed for one call.
    pub fn with_value(mut self, value: i64, unit: DurationUnit) -> Self {
        self.value = value;
        self.unit = unit;
        self
    }

    /// Enables or disables the policy.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
