//! Property tests for duration unit conversion.
//!
//! Invariants tested:
//! - Conversion agrees with the unit's size whenever it fits
//! - Out-of-range amounts are reported as overflow, never wrapped
//! - Negative amounts are reported as negative

use faultguard_core::{DefinitionError, DurationUnit};
use proptest::prelude::*;
use std::time::Duration;

fn unit() -> impl Strategy<Value = (DurationUnit, u64)> {
    prop_oneof![
        Just((DurationUnit::Nanos, 1)),
        Just((DurationUnit::Micros, 1_000)),
        Just((DurationUnit::Millis, 1_000_000)),
        Just((DurationUnit::Seconds, 1_000_000_000)),
        Just((DurationUnit::Minutes, 60_000_000_000)),
        Just((DurationUnit::Hours, 3_600_000_000_000)),
        Just((DurationUnit::HalfDays, 43_200_000_000_000)),
        Just((DurationUnit::Days, 86_400_000_000_000)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: a resolved amount equals amount * unit size in nanoseconds
    #[test]
    fn resolve_matches_unit_size((unit, nanos) in unit(), amount in 0i64..=i64::MAX) {
        let result = unit.resolve(amount, "timeout", "value");
        match (amount as u64).checked_mul(nanos) {
            Some(total) => prop_assert_eq!(result, Ok(Duration::from_nanos(total))),
            None => prop_assert_eq!(
                result,
                Err(DefinitionError::Overflow { policy: "timeout", field: "value" })
            ),
        }
    }

    /// Property: every negative amount is rejected in every unit
    #[test]
    fn negative_amounts_rejected((unit, _) in unit(), amount in i64::MIN..0) {
        prop_assert_eq!(
            unit.resolve(amount, "retry", "jitter"),
            Err(DefinitionError::Negative { policy: "retry", field: "jitter" })
        );
    }

    /// Property: larger amounts never resolve to shorter durations
    #[test]
    fn resolve_is_monotonic((unit, _) in unit(), a in 0i64..100_000, b in 0i64..100_000) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low = unit.resolve(low, "circuit_breaker", "delay").unwrap();
        let high = unit.resolve(high, "circuit_breaker", "delay").unwrap();
        prop_assert!(low <= high);
    }
}
