//! Tower layer routing service calls through an [`ExecutionManager`].

use crate::manager::ExecutionManager;
use crate::metadata::OperationMetadata;
use faultguard_core::{invocation, Classify, FaultToleranceError, OperationId};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::layer::Layer;
use tower::{Service, ServiceExt};

/// A Tower layer guarding a service as one operation.
///
/// Each request becomes an invocation that clones the inner service and the
/// request, so retries replay the same request against a fresh clone.
///
/// ```
/// use faultguard::{ExecutionManager, FaultToleranceLayer, OperationMetadata, TimeoutMetadata};
/// use faultguard_core::OperationId;
/// use std::sync::Arc;
/// use tower::{service_fn, Layer, ServiceExt};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let layer = FaultToleranceLayer::new(
///     Arc::new(ExecutionManager::builder().build()),
///     OperationId::new("app::Echo", "call"),
///     OperationMetadata::new().with_timeout(TimeoutMetadata::new()),
/// );
/// let service = layer.layer(service_fn(|req: String| async move {
///     Ok::<_, std::io::Error>(req)
/// }));
///
/// assert_eq!(service.oneshot("hi".to_string()).await.unwrap(), "hi");
/// # }
/// ```
#[derive(Clone)]
pub struct FaultToleranceLayer {
    manager: Arc<ExecutionManager>,
    operation: OperationId,
    metadata: Arc<OperationMetadata>,
}

impl FaultToleranceLayer {
    pub fn new(
        manager: Arc<ExecutionManager>,
        operation: OperationId,
        metadata: OperationMetadata,
    ) -> Self {
        Self {
            manager,
            operation,
            metadata: Arc::new(metadata),
        }
    }
}

impl<S> Layer<S> for FaultToleranceLayer {
    type Service = FaultTolerant<S>;

    fn layer(&self, service: S) -> Self::Service {
        FaultTolerant {
            inner: service,
            manager: Arc::clone(&self.manager),
            operation: self.operation.clone(),
            metadata: Arc::clone(&self.metadata),
        }
    }
}

/// A service whose calls run under an operation's fault tolerance policies.
#[derive(Clone)]
pub struct FaultTolerant<S> {
    inner: S,
    manager: Arc<ExecutionManager>,
    operation: OperationId,
    metadata: Arc<OperationMetadata>,
}

impl<S, Req> Service<Req> for FaultTolerant<S>
where
    S: Service<Req> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Classify + Send + 'static,
    Req: Clone + Send + Sync + 'static,
{
    type Response = S::Response;
    type Error = FaultToleranceError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    // Readiness is awaited per attempt on a fresh clone of the inner service.
    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let service = self.inner.clone();
        let manager = Arc::clone(&self.manager);
        let operation = self.operation.clone();
        let metadata = Arc::clone(&self.metadata);

        let call = invocation(move || service.clone().oneshot(req.clone()));

        Box::pin(async move { manager.execute(&operation, &metadata, call).await })
    }
}
