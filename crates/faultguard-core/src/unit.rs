//! Duration units used by declarative policy metadata.

use crate::error::DefinitionError;
use std::time::Duration;

/// Unit attached to an amount in declarative metadata (`delay`, `maxDuration`, ...).
///
/// Metadata carries `(amount, unit)` pairs; models convert them to a
/// [`Duration`] once, at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DurationUnit {
    /// Nanoseconds.
    Nanos,
    /// Microseconds.
    Micros,
    /// Milliseconds.
    #[default]
    Millis,
    /// Seconds.
    Seconds,
    /// Minutes.
    Minutes,
    /// Hours.
    Hours,
    /// Twelve hours.
    HalfDays,
    /// Twenty-four hours.
    Days,
}

impl DurationUnit {
    fn nanos_per_unit(self) -> u64 {
        const SECOND: u64 = 1_000_000_000;
        match self {
            DurationUnit::Nanos => 1,
            DurationUnit::Micros => 1_000,
            DurationUnit::Millis => 1_000_000,
            DurationUnit::Seconds => SECOND,
            DurationUnit::Minutes => 60 * SECOND,
            DurationUnit::Hours => 3_600 * SECOND,
            DurationUnit::HalfDays => 43_200 * SECOND,
            DurationUnit::Days => 86_400 * SECOND,
        }
    }

    /// Converts `amount` of this unit into a [`Duration`].
    ///
    /// Returns `None` when the result does not fit in a `u64` nanosecond count.
    ///
    /// ```
    /// use faultguard_core::DurationUnit;
    /// use std::time::Duration;
    ///
    /// assert_eq!(DurationUnit::Seconds.to_duration(2), Some(Duration::from_secs(2)));
    /// assert_eq!(DurationUnit::Days.to_duration(u64::MAX), None);
    /// ```
    pub fn to_duration(self, amount: u64) -> Option<Duration> {
        amount
            .checked_mul(self.nanos_per_unit())
            .map(Duration::from_nanos)
    }

    /// Converts a signed metadata amount, reporting which field was invalid.
    ///
    /// ```
    /// use faultguard_core::{DefinitionError, DurationUnit};
    ///
    /// let err = DurationUnit::Millis.resolve(-1, "retry", "delay").unwrap_err();
    /// assert!(matches!(err, DefinitionError::Negative { field: "delay", .. }));
    /// ```
    pub fn resolve(
        self,
        amount: i64,
        policy: &'static str,
        field: &'static str,
    ) -> Result<Duration, DefinitionError> {
        let amount = DefinitionError::non_negative(amount, policy, field)?;
        self.to_duration(amount)
            .ok_or(DefinitionError::Overflow { policy, field })
    }
}
