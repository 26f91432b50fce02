use faultguard_core::{DurationUnit, FailureKind, FailureSet};

/// Declarative circuit breaker metadata attached to an operation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CircuitBreakerMetadata {
    /// Size of the rolling window of recent outcomes. Default: 20
    pub request_volume_threshold: i64,
    /// Failure share of a full window that opens the circuit. Default: 0.5
    pub failure_ratio: f64,
    /// How long the circuit stays open. Default: 5000
    pub delay: i64,
    /// Unit of `delay`. Default: milliseconds
    pub delay_unit: DurationUnit,
    /// Consecutive half-open successes that close the circuit. Default: 1
    pub success_threshold: i64,
    /// Failure kinds counted as failures. Default: every kind
    pub fail_on: FailureSet,
    /// Failure kinds counted as successes even when `fail_on` matches. Default: none
    pub skip_on: FailureSet,
    /// Whether the policy applies at all. Default: true
    pub enabled: bool,
}

impl Default for CircuitBreakerMetadata {
    fn default() -> Self {
        Self {
            request_volume_threshold: 20,
            failure_ratio: 0.5,
            delay: 5000,
            delay_unit: DurationUnit::Millis,
            success_threshold: 1,
            fail_on: FailureSet::any(),
            skip_on: FailureSet::new(),
            enabled: true,
        }
    }
}

impl CircuitBreakerMetadata {
    /// Creates metadata with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rolling window size.
    pub fn with_request_volume_threshold(mut self, threshold: i64) -> Self {
        self.request_volume_threshold = threshold;
        self
    }

    /// Sets the failure ratio that opens the circuit.
    pub fn with_failure_ratio(mut self, ratio: f64) -> Self {
        self.failure_ratio = ratio;
        self
    }

    /// Sets how long the circuit stays open.
    pub fn with_delay(mut self, delay: i64, unit: DurationUnit) -> Self {
        self.delay = delay;
        self.delay_unit = unit;
        self
    }

    /// Sets the consecutive successes needed to close a half-open circuit.
    pub fn with_success_threshold(mut self, threshold: i64) -> Self {
        self.success_threshold = threshold;
        self
    }

    /// Replaces the failure kinds counted as failures.
    pub fn with_fail_on<I, K>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<FailureKind>,
    {
        self.fail_on = FailureSet::of(kinds);
        self
    }

    /// Replaces the failure kinds that never count as failures.
    pub fn with_skip_on<I, K>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<FailureKind>,
    {
        self.skip_on = FailureSet::of(kinds);
        self
    }

    /// Enables or disables the policy.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
