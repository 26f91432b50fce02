use crate::config::CircuitBreakerMetadata;
use faultguard_core::{Classify, DefinitionError, FailureSet};
use std::time::Duration;

const POLICY: &str = "circuit_breaker";

/// Validated, immutable circuit breaker policy for one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerModel {
    request_volume_threshold: usize,
    failure_ratio: f64,
    delay: Duration,
    success_threshold: usize,
    fail_on: FailureSet,
    skip_on: FailureSet,
    disabled: bool,
}

impl CircuitBreakerModel {
    /// Validates `metadata`.
    ///
    /// Both thresholds must be at least 1 and `failure_ratio` must lie in
    /// `[0, 1]`.
    pub fn from_metadata(metadata: &CircuitBreakerMetadata) -> Result<Self, DefinitionError> {
        let request_volume_threshold = at_least_one(
            metadata.request_volume_threshold,
            "request_volume_threshold",
        )?;
        if !(0.0..=1.0).contains(&metadata.failure_ratio) {
            return Err(DefinitionError::OutOfRange {
                policy: POLICY,
                field: "failure_ratio",
                reason: "must be between 0 and 1",
            });
        }
        let delay = metadata.delay_unit.resolve(metadata.delay, POLICY, "delay")?;
        let success_threshold = at_least_one(metadata.success_threshold, "success_threshold")?;

        Ok(Self {
            request_volume_threshold,
            failure_ratio: metadata.failure_ratio,
            delay,
            success_threshold,
            fail_on: metadata.fail_on.clone(),
            skip_on: metadata.skip_on.clone(),
            disabled: !metadata.enabled,
        })
    }

    /// Size of the rolling window.
    pub fn request_volume_threshold(&self) -> usize {
        self.request_volume_threshold
    }

    /// Failure share of a full window that opens the circuit.
    pub fn failure_ratio(&self) -> f64 {
        self.failure_ratio
    }

    /// How long the circuit stays open before admitting a trial call.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Consecutive half-open successes that close the circuit.
    pub fn success_threshold(&self) -> usize {
        self.success_threshold
    }

    pub fn fail_on(&self) -> &FailureSet {
        &self.fail_on
    }

    pub fn skip_on(&self) -> &FailureSet {
        &self.skip_on
    }

    /// Returns true if the policy was declared but switched off.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns true if `failure` counts against the circuit.
    pub fn counts_as_failure<C: Classify + ?Sized>(&self, failure: &C) -> bool {
        self.fail_on.matches(failure) && !self.skip_on.matches(failure)
    }
}

fn at_least_one(value: i64, field: &'static str) -> Result<usize, DefinitionError> {
    if value < 1 {
        return Err(DefinitionError::OutOfRange {
            policy: POLICY,
            field,
            reason: "must be at least 1",
        });
    }
    Ok(usize::try_from(value).unwrap_or(usize::MAX))
}
