//! Shared fixtures for engine tests.

use faultguard::core::{invocation, Classify, FailureKind, Invocation};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    Unavailable,
    BadRequest,
}

impl Classify for ServiceError {
    fn kind(&self) -> FailureKind {
        match self {
            ServiceError::Unavailable => FailureKind::new("unavailable"),
            ServiceError::BadRequest => FailureKind::new("bad_request"),
        }
    }
}

/// Counts calls; fails with `Unavailable` while `fail_first` calls remain.
pub fn flaky(calls: &Arc<AtomicUsize>, fail_first: usize) -> Invocation<usize, ServiceError> {
    scripted(calls, move |n| (n < fail_first).then_some(ServiceError::Unavailable))
}

/// Always fails with `err`.
pub fn failing(calls: &Arc<AtomicUsize>, err: ServiceError) -> Invocation<usize, ServiceError> {
    scripted(calls, move |_| Some(err.clone()))
}

/// Counts calls; call `n` fails with `outcome(n)` if that is `Some`.
pub fn scripted<F>(calls: &Arc<AtomicUsize>, outcome: F) -> Invocation<usize, ServiceError>
where
    F: Fn(usize) -> Option<ServiceError> + Send + Sync + 'static,
{
    let calls = Arc::clone(calls);
    invocation(move || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        let err = outcome(n);
        async move {
            match err {
                Some(err) => Err(err),
                None => Ok(n),
            }
        }
    })
}
