//! Singular request dispatch.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug_span, warn};

use conduit_core::{
    AmbiguousHandler, BoxError, DispatchKind, DispatchObserver, NoHandlerFound, NoopObserver,
    Request, RequestHandler, RequestSender, Resolver, ResolverDetached, ResolverExt,
};

/// Routes each request to the one handler registered for its type.
#[derive(Clone)]
pub struct RequestDispatcher {
    resolver: Arc<dyn Resolver>,
    observer: Arc<dyn DispatchObserver>,
}

impl RequestDispatcher {
    /// Creates a dispatcher over `resolver` with a no-op observer.
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self {
            resolver,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Creates a dispatcher over `resolver`, using the [`DispatchObserver`]
    /// registered there if there is one.
    pub fn from_resolver(resolver: &Arc<dyn Resolver>) -> Self {
        let observer = resolver
            .resolve_one::<dyn DispatchObserver>()
            .unwrap_or_else(|| Arc::new(NoopObserver));
        Self {
            resolver: Arc::clone(resolver),
            observer,
        }
    }

    /// Replaces the observer.
    pub fn with_observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Invokes the handler registered for `R` and returns its response.
    ///
    /// # Errors
    ///
    /// - [`NoHandlerFound`] if no handler is registered for `R`.
    /// - [`AmbiguousHandler`] if the resolver yields more than one.
    /// - [`ResolverDetached`] if the registry behind the resolver is gone.
    /// - Otherwise, whatever the handler returned, unchanged.
    pub async fn dispatch<R: Request>(
        &self,
        request: R,
        ct: CancellationToken,
    ) -> Result<R::Response, BoxError> {
        let request_type = type_name::<R>();
        self.observer
            .dispatching(DispatchKind::Request, request_type);

        if self.resolver.is_detached() {
            warn!(request_type, "Request dispatcher outlived its registry");
            return Err(Box::new(ResolverDetached {
                message_type: request_type,
            }));
        }

        let mut handlers = self.resolver.resolve_all::<dyn RequestHandler<R>>();
        if handlers.len() > 1 {
            self.observer.unroutable(request_type, handlers.len());
            return Err(Box::new(AmbiguousHandler {
                request_type,
                count: handlers.len(),
            }));
        }
        let Some(handler) = handlers.pop() else {
            self.observer.unroutable(request_type, 0);
            return Err(Box::new(NoHandlerFound::new(request_type)));
        };

        let name = handler.name();
        self.observer.handler_invoking(DispatchKind::Request, name);

        let outcome = handler
            .handle_request(request, ct)
            .instrument(debug_span!("send", request_type, handler = name))
            .await;

        match &outcome {
            Ok(_) => self.observer.handler_completed(DispatchKind::Request, name),
            Err(error) => self
                .observer
                .handler_failed(DispatchKind::Request, name, &**error),
        }
        outcome
    }
}

#[async_trait]
impl RequestSender for RequestDispatcher {
    async fn send_request<R: Request>(
        &self,
        request: R,
        cancellation: Option<CancellationToken>,
    ) -> Result<R::Response, BoxError> {
        self.dispatch(request, cancellation.unwrap_or_default())
            .await
    }
}

impl fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDispatcher").finish_non_exhaustive()
    }
}
