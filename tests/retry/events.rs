//! Retry event tests.

use faultguard_core::{
    invocation, Classify, DurationUnit, EventListeners, ExecutionPlan, FailureKind, OperationId,
    PolicyEvent, Proceed,
};
use faultguard_retry::{RetryEvent, RetryManager, RetryMetadata};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct Refused;

impl Classify for Refused {
    fn kind(&self) -> FailureKind {
        FailureKind::new("refused")
    }
}

fn recording_manager() -> (RetryManager, Arc<Mutex<Vec<RetryEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let mut listeners = EventListeners::new();
    listeners.add_fn(move |event: &RetryEvent| sink.lock().unwrap().push(event.clone()));
    (RetryManager::with_listeners(listeners), events)
}

fn event_types(events: &Mutex<Vec<RetryEvent>>) -> Vec<&'static str> {
    events.lock().unwrap().iter().map(|e| e.event_type()).collect()
}

#[tokio::test]
async fn retries_then_success() {
    let (manager, events) = recording_manager();
    let operation = OperationId::new("retry::events", "recover");
    let metadata = RetryMetadata::new()
        .with_max_retries(3)
        .with_jitter(0, DurationUnit::Millis);
    let model = manager.get_or_create(&operation, &metadata).unwrap();
    let plan = manager.plan(&operation, model, Proceed::shared());

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    plan.execute(invocation(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move { if n < 2 { Err(Refused) } else { Ok(()) } }
    }))
    .await
    .unwrap();

    assert_eq!(event_types(&events), vec!["retry", "retry", "success"]);

    let recorded = events.lock().unwrap();
    assert!(recorded.iter().all(|e| e.operation() == operation.as_str()));
    match &recorded[1] {
        RetryEvent::Retry { attempt, .. } => assert_eq!(*attempt, 2),
        other => panic!("unexpected event {other:?}"),
    }
    match &recorded[2] {
        RetryEvent::Success { attempts, .. } => assert_eq!(*attempts, 3),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn exhaustion_and_abort_are_reported() {
    let (manager, events) = recording_manager();

    let exhausted = OperationId::new("retry::events", "exhausted");
    let model = manager
        .get_or_create(
            &exhausted,
            &RetryMetadata::new()
                .with_max_retries(1)
                .with_jitter(0, DurationUnit::Millis),
        )
        .unwrap();
    let plan = manager.plan(&exhausted, model, Proceed::shared());
    plan.execute(invocation(|| async { Err::<(), _>(Refused) }))
        .await
        .unwrap_err();

    let aborted = OperationId::new("retry::events", "aborted");
    let model = manager
        .get_or_create(&aborted, &RetryMetadata::new().with_abort_on(["refused"]))
        .unwrap();
    let plan = manager.plan(&aborted, model, Proceed::shared());
    plan.execute(invocation(|| async { Err::<(), _>(Refused) }))
        .await
        .unwrap_err();

    assert_eq!(event_types(&events), vec!["retry", "exhausted", "aborted"]);
    assert_eq!(manager.len(), 2);
}

#[tokio::test]
async fn panicking_listener_does_not_break_the_call() {
    let mut listeners = EventListeners::new();
    listeners.add_fn(|_: &RetryEvent| panic!("listener failure"));
    let manager = RetryManager::with_listeners(listeners);
    let operation = OperationId::new("retry::events", "panicky");
    let model = manager
        .get_or_create(
            &operation,
            &RetryMetadata::new()
                .with_max_retries(1)
                .with_jitter(0, DurationUnit::Millis),
        )
        .unwrap();
    let plan = manager.plan(&operation, model, Proceed::shared());

    let result = plan
        .execute(invocation(|| async { Ok::<_, Refused>(7) }))
        .await;
    assert_eq!(result.unwrap(), 7);
}
