//! Property tests for the bulkhead.
//!
//! Invariants tested:
//! - Concurrent executions never exceed max_concurrent_executions
//! - Admitted + rejected always equals the number of calls
//! - Every permit is returned once all calls finish

use faultguard_bulkhead::{BulkheadManager, BulkheadMetadata};
use faultguard_core::{invocation, ExecutionPlan, OperationId, Proceed};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn concurrency_and_admission_are_bounded(
        max_concurrent in 1i64..6,
        max_waiting in 0i64..6,
        callers in 1usize..20,
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();
        rt.block_on(async {
            let manager = BulkheadManager::new();
            let bulkhead = manager
                .get_or_create(
                    &OperationId::new("property::bulkhead", "bounded"),
                    &BulkheadMetadata::new()
                        .with_value(max_concurrent)
                        .with_waiting_task_queue(max_waiting),
                )
                .unwrap();
            let plan = Arc::new(manager.plan(Arc::clone(&bulkhead), Proceed::shared()));
            let active = Arc::new(AtomicUsize::new(0));
            let peak = Arc::new(AtomicUsize::new(0));

            let mut handles = Vec::new();
            for _ in 0..callers {
                let plan = Arc::clone(&plan);
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                handles.push(tokio::spawn(async move {
                    plan.execute(invocation(move || {
                        let active = Arc::clone(&active);
                        let peak = Arc::clone(&peak);
                        async move {
                            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(5)).await;
                            active.fetch_sub(1, Ordering::SeqCst);
                            Ok::<_, std::io::Error>(())
                        }
                    }))
                    .await
                }));
            }

            let mut admitted = 0usize;
            let mut rejected = 0usize;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(()) => admitted += 1,
                    Err(err) => {
                        prop_assert!(err.is_bulkhead_full());
                        rejected += 1;
                    }
                }
            }

            let capacity = (max_concurrent + max_waiting) as usize;
            prop_assert!(peak.load(Ordering::SeqCst) <= max_concurrent as usize);
            prop_assert_eq!(admitted + rejected, callers);
            prop_assert!(admitted >= callers.min(max_concurrent as usize));
            prop_assert!(rejected <= callers.saturating_sub(capacity.min(callers)));
            prop_assert_eq!(bulkhead.available_permits(), max_concurrent as usize);
            prop_assert_eq!(bulkhead.waiting_executions(), 0);
            Ok(())
        })?;
    }
}
