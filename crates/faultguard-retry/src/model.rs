use crate::config::RetryMetadata;
use faultguard_core::{Classify, DefinitionError, FailureSet};
use rand::Rng;
use std::time::Duration;

const POLICY: &str = "retry";

/// Validated, immutable retry policy for one operation.
///
/// Built once from [`RetryMetadata`] and shared by every call to the
/// operation. Construction fails if any amount is negative or if `delay`
/// is longer than `max_duration`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryModel {
    max_retries: usize,
    delay: Duration,
    max_duration: Duration,
    jitter: Duration,
    retry_on: FailureSet,
    abort_on: FailureSet,
    disabled: bool,
}

impl RetryModel {
    /// Validates `metadata` and converts every amount with its own unit.
    ///
    /// ```
    /// use faultguard_core::{DefinitionError, DurationUnit};
    /// use faultguard_retry::{RetryMetadata, RetryModel};
    ///
    /// let err = RetryModel::from_metadata(
    ///     &RetryMetadata::new()
    ///         .with_delay(2, DurationUnit::Seconds)
    ///         .with_max_duration(1, DurationUnit::Seconds),
    /// )
    /// .unwrap_err();
    /// assert!(matches!(err, DefinitionError::DelayExceedsMaxDuration { .. }));
    /// ```
    pub fn from_metadata(metadata: &RetryMetadata) -> Result<Self, DefinitionError> {
        let max_retries = DefinitionError::non_negative(metadata.max_retries, POLICY, "max_retries")?;
        let delay = metadata.delay_unit.resolve(metadata.delay, POLICY, "delay")?;
        let max_duration = metadata
            .duration_unit
            .resolve(metadata.max_duration, POLICY, "max_duration")?;
        let jitter = metadata.jitter_unit.resolve(metadata.jitter, POLICY, "jitter")?;

        if delay > max_duration {
            return Err(DefinitionError::DelayExceedsMaxDuration {
                delay,
                max_duration,
            });
        }

        Ok(Self {
            max_retries: usize::try_from(max_retries).unwrap_or(usize::MAX),
            delay,
            max_duration,
            jitter,
            retry_on: metadata.retry_on.clone(),
            abort_on: metadata.abort_on.clone(),
            disabled: !metadata.enabled,
        })
    }

    /// Retries allowed after the initial attempt.
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Fixed pause between attempts.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Time budget for one logical call.
    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    /// Upper bound (exclusive) of the random extra pause.
    pub fn jitter(&self) -> Duration {
        self.jitter
    }

    /// Failure kinds that may be retried.
    pub fn retry_on(&self) -> &FailureSet {
        &self.retry_on
    }

    /// Failure kinds that stop retrying.
    pub fn abort_on(&self) -> &FailureSet {
        &self.abort_on
    }

    /// Returns true if the policy was declared but switched off.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns true if `failure` may be retried.
    pub fn retries_on<C: Classify + ?Sized>(&self, failure: &C) -> bool {
        self.retry_on.matches(failure)
    }

    /// Returns true if `failure` must stop the retry loop.
    pub fn aborts_on<C: Classify + ?Sized>(&self, failure: &C) -> bool {
        self.abort_on.matches(failure)
    }

    /// Pause before the next attempt: `delay` plus a fresh uniform draw from
    /// `[0, jitter)`, never longer than `max_duration`.
    pub fn next_pause(&self) -> Duration {
        self.next_pause_with(&mut rand::rng())
    }

    /// [`next_pause`](Self::next_pause) with a caller-supplied random source.
    pub fn next_pause_with<R: Rng>(&self, rng: &mut R) -> Duration {
        let jitter = u64::try_from(self.jitter.as_nanos()).unwrap_or(u64::MAX);
        let extra = if jitter == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(rng.random_range(0..jitter))
        };
        self.delay.saturating_add(extra).min(self.max_duration)
    }
}
