use faultguard_core::{DurationUnit, FailureKind, FailureSet};

/// Declarative retry metadata attached to an operation.
///
/// Amounts are signed so that metadata read from an untyped source can be
/// carried as-is; [`RetryModel::from_metadata`](crate::RetryModel::from_metadata)
/// rejects negative values.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetryMetadata {
    /// Retries allowed after the initial attempt. Default: 3
    pub max_retries: i64,
    /// Fixed pause between attempts. Default: 0
    pub delay: i64,
    /// Unit of `delay`. Default: milliseconds
    pub delay_unit: DurationUnit,
    /// Time budget for one logical call, all attempts included. Default: 180000
    pub max_duration: i64,
    /// Unit of `max_duration`. Default: milliseconds
    pub duration_unit: DurationUnit,
    /// Upper bound of the random extra pause. Default: 200
    pub jitter: i64,
    /// Unit of `jitter`. Default: milliseconds
    pub jitter_unit: DurationUnit,
    /// Failure kinds that may be retried. Default: every kind
    pub retry_on: FailureSet,
    /// Failure kinds that stop retrying at once. Default: none
    pub abort_on: FailureSet,
    /// Whether the policy applies at all. Default: true
    pub enabled: bool,
}

impl Default for RetryMetadata {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: 0,
            delay_unit: DurationUnit::Millis,
            max_duration: 180_000,
            duration_unit: DurationUnit::Millis,
            jitter: 200,
            jitter_unit: DurationUnit::Millis,
            retry_on: FailureSet::any(),
            abort_on: FailureSet::new(),
            enabled: true,
        }
    }
}

impl RetryMetadata {
    /// Creates metadata with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of retries after the initial attempt.
    pub fn with_max_retries(mut self, max_retries: i64) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the fixed pause between attempts.
    pub fn with_delay(mut self, delay: i64, unit: DurationUnit) -> Self {
        self.delay = delay;
        self.delay_unit = unit;
        self
    }

    /// Sets the time budget for one logical call.
    pub fn with_max_duration(mut self, max_duration: i64, unit: DurationUnit) -> Self {
        self.max_duration = max_duration;
        self.duration_unit = unit;
        self
    }

    /// Sets the jitter bound.
    pub fn with_jitter(mut self, jitter: i64, unit: DurationUnit) -> Self {
        self.jitter = jitter;
        self.jitter_unit = unit;
        self
    }

    /// Replaces the retryable failure kinds.
    pub fn with_retry_on<I, K>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<FailureKind>,
    {
        self.retry_on = FailureSet::of(kinds);
        self
    }

    /// Replaces the failure kinds that abort retrying.
    pub fn with_abort_on<I, K>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<FailureKind>,
    {
        self.abort_on = FailureSet::of(kinds);
        self
    }

    /// Enables or disables the policy.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
