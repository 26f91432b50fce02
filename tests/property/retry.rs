//! Property tests for the retry policy.
//!
//! Invariants tested:
//! - Pauses stay within [delay, delay + jitter) and never exceed max_duration
//! - A model exists exactly when delay <= max_duration
//! - Negative amounts are always rejected
//! - The attempt count never exceeds max_retries + 1

use faultguard_core::{
    invocation, Classify, DefinitionError, DurationUnit, ExecutionPlan, FailureKind, OperationId,
    Proceed,
};
use faultguard_retry::{RetryManager, RetryMetadata, RetryModel};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
struct AlwaysFails;

impl Classify for AlwaysFails {
    fn kind(&self) -> FailureKind {
        FailureKind::new("always")
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: pause = delay + jitter draw, clamped to max_duration
    #[test]
    fn pause_is_bounded(
        delay_ms in 0i64..1_000,
        jitter_ms in 0i64..1_000,
        extra_ms in 0i64..5_000,
        seed in any::<u64>(),
    ) {
        let model = RetryModel::from_metadata(
            &RetryMetadata::new()
                .with_delay(delay_ms, DurationUnit::Millis)
                .with_jitter(jitter_ms, DurationUnit::Millis)
                .with_max_duration(delay_ms + extra_ms, DurationUnit::Millis),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..10 {
            let pause = model.next_pause_with(&mut rng);
            prop_assert!(pause >= model.delay());
            prop_assert!(pause <= model.max_duration());
            if jitter_ms > 0 {
                prop_assert!(pause < model.delay() + model.jitter());
            } else {
                prop_assert_eq!(pause, model.delay());
            }
        }
    }

    /// Property: validation accepts exactly the delays that fit the budget
    #[test]
    fn delay_must_fit_max_duration(
        delay_ms in 0i64..10_000,
        max_duration_ms in 0i64..10_000,
    ) {
        let result = RetryModel::from_metadata(
            &RetryMetadata::new()
                .with_delay(delay_ms, DurationUnit::Millis)
                .with_max_duration(max_duration_ms, DurationUnit::Millis),
        );

        if delay_ms <= max_duration_ms {
            prop_assert!(result.is_ok());
        } else {
            let is_delay_error = matches!(
                result,
                Err(DefinitionError::DelayExceedsMaxDuration { .. })
            );
            prop_assert!(is_delay_error);
        }
    }

    /// Property: negative retry counts never validate
    #[test]
    fn negative_max_retries_rejected(max_retries in i64::MIN..0) {
        let err = RetryModel::from_metadata(&RetryMetadata::new().with_max_retries(max_retries))
            .unwrap_err();
        prop_assert_eq!(
            err,
            DefinitionError::Negative { policy: "retry", field: "max_retries" }
        );
    }

    /// Property: a failing call runs exactly max_retries + 1 times
    #[test]
    fn attempts_never_exceed_budget(max_retries in 0i64..8) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let manager = RetryManager::new();
            let operation = OperationId::new("property::retry", "budget");
            let metadata = RetryMetadata::new()
                .with_max_retries(max_retries)
                .with_jitter(0, DurationUnit::Millis);
            let model = manager.get_or_create(&operation, &metadata).unwrap();
            let plan = manager.plan(&operation, model, Proceed::shared());

            let calls = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&calls);
            let err = plan
                .execute(invocation(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>(AlwaysFails) }
                }))
                .await
                .unwrap_err();

            let expected = usize::try_from(max_retries).unwrap() + 1;
            prop_assert!(err.is_retry_exhausted());
            prop_assert_eq!(calls.load(Ordering::SeqCst), expected);
            prop_assert_eq!(err.attempts(), Some(expected));
            Ok(())
        })?;
    }
}

#[test]
fn zero_jitter_pause_is_exactly_the_delay() {
    let model = RetryModel::from_metadata(
        &RetryMetadata::new()
            .with_delay(250, DurationUnit::Millis)
            .with_jitter(0, DurationUnit::Millis),
    )
    .unwrap();
    assert_eq!(model.next_pause(), Duration::from_millis(250));
}
