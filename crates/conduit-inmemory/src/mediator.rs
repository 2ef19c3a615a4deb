//! The mediator facade.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use conduit_core::{
    BoxError, DispatcherNotBound, Event, EventSender, Request, RequestSender, Resolver,
    ResolverDetached, ResolverExt,
};

use crate::event::EventDispatcher;
use crate::request::RequestDispatcher;

/// Single entry point for publishing events and sending requests.
///
/// The facade holds no dispatcher of its own. On every call it resolves the
/// current `ES` (for events) or `RS` (for requests) from the resolver and
/// forwards the call unchanged, so replacing a sender registration changes
/// what the next call uses.
///
/// `ES` and `RS` default to the in-memory dispatchers; any other sender
/// implementation registered under its own type works the same way.
pub struct InMemoryMediator<ES = EventDispatcher, RS = RequestDispatcher> {
    resolver: Arc<dyn Resolver>,
    _senders: PhantomData<fn() -> (ES, RS)>,
}

impl<ES, RS> InMemoryMediator<ES, RS> {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self {
            resolver,
            _senders: PhantomData,
        }
    }
}

impl<ES, RS> InMemoryMediator<ES, RS>
where
    ES: EventSender + 'static,
    RS: RequestSender + 'static,
{
    fn sender<S: Send + Sync + 'static>(
        &self,
        message_type: &'static str,
    ) -> Result<Arc<S>, BoxError> {
        if self.resolver.is_detached() {
            return Err(Box::new(ResolverDetached { message_type }));
        }
        self.resolver.resolve_one::<S>().ok_or_else(|| {
            Box::new(DispatcherNotBound {
                dispatcher: type_name::<S>(),
            }) as BoxError
        })
    }
}

#[async_trait]
impl<ES, RS> EventSender for InMemoryMediator<ES, RS>
where
    ES: EventSender + 'static,
    RS: RequestSender + 'static,
{
    async fn publish_event<E: Event>(
        &self,
        event: &E,
        cancellation: Option<CancellationToken>,
    ) -> Result<(), BoxError> {
        let sender = self.sender::<ES>(type_name::<E>())?;
        sender.publish_event(event, cancellation).await
    }
}

#[async_trait]
impl<ES, RS> RequestSender for InMemoryMediator<ES, RS>
where
    ES: EventSender + 'static,
    RS: RequestSender + 'static,
{
    async fn send_request<R: Request>(
        &self,
        request: R,
        cancellation: Option<CancellationToken>,
    ) -> Result<R::Response, BoxError> {
        let sender = self.sender::<RS>(type_name::<R>())?;
        sender.send_request(request, cancellation).await
    }
}

impl<ES, RS> Clone for InMemoryMediator<ES, RS> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            _senders: PhantomData,
        }
    }
}

impl<ES, RS> fmt::Debug for InMemoryMediator<ES, RS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryMediator")
            .field("event_sender", &type_name::<ES>())
            .field("request_sender", &type_name::<RS>())
            .finish()
    }
}
