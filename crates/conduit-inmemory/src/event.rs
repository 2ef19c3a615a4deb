//! Multicast event dispatch.
//!
//! [`EventDispatcher`] resolves every handler registered for an event type
//! and runs them concurrently on the caller's task. The dispatch returns only
//! after every handler has finished, successfully or not.
//!
//! ```text
//! publish(Ping) ──▶ resolve dyn EventHandler<Ping>
//!                     ├─▶ A ──┐
//!                     ├─▶ B ──┼──▶ collect (completion order) ──▶ Ok / Aggregate
//!                     └─▶ C ──┘
//! ```
//!
//! A failing or panicking handler never cancels its siblings; every failure
//! of the call ends up in one [`AggregateHandlerFailure`].

use std::any::type_name;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span, warn};

use conduit_core::{
    AggregateHandlerFailure, BoxError, DispatchKind, DispatchObserver, Event, EventHandler,
    EventSender, HandlerFailure, HandlerPanicked, NoopObserver, Resolver, ResolverDetached,
    ResolverExt,
};

/// Publishes events to all of their registered handlers.
///
/// Cloning is cheap and clones share the resolver and observer.
#[derive(Clone)]
pub struct EventDispatcher {
    resolver: Arc<dyn Resolver>,
    observer: Arc<dyn DispatchObserver>,
}

impl EventDispatcher {
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

    /// Runs every handler registered for `E` and waits for all of them.
    ///
    /// With no registered handler this succeeds immediately. Otherwise every
    /// handler is started before any is awaited.
    ///
    /// # Errors
    ///
    /// - [`AggregateHandlerFailure`] if at least one handler failed.
    /// - [`ResolverDetached`] if the registry behind the resolver is gone.
    pub async fn dispatch<E: Event>(
        &self,
        event: &E,
        ct: CancellationToken,
    ) -> Result<(), BoxError> {
        let event_type = type_name::<E>();
        self.observer.dispatching(DispatchKind::Event, event_type);

        if self.resolver.is_detached() {
            warn!(event_type, "Event dispatcher outlived its registry");
            return Err(Box::new(ResolverDetached {
                message_type: event_type,
            }));
        }

        let handlers = self.resolver.resolve_all::<dyn EventHandler<E>>();
        if handlers.is_empty() {
            debug!(event_type, "No event handlers registered");
            return Ok(());
        }

        let span = debug_span!("publish", event_type, handlers = handlers.len());
        async {
            let mut pending: FuturesUnordered<_> = handlers
                .iter()
                .map(|handler| self.invoke(handler.as_ref(), event, ct.clone()))
                .collect();

            let mut failures = Vec::new();
            while let Some(outcome) = pending.next().await {
                if let Err(failure) = outcome {
                    failures.push(failure);
                }
            }

            match AggregateHandlerFailure::new(event_type, failures) {
                Some(aggregate) => Err(Box::new(aggregate) as BoxError),
                None => Ok(()),
            }
        }
        .instrument(span)
        .await
    }

    async fn invoke<E: Event>(
        &self,
        handler: &dyn EventHandler<E>,
        event: &E,
        ct: CancellationToken,
    ) -> Result<(), HandlerFailure> {
        let name = handler.name();
        self.observer.handler_invoking(DispatchKind::Event, name);

        let outcome = AssertUnwindSafe(async { handler.handle_event(event, ct).await })
            .catch_unwind()
            .await;

        let error: BoxError = match outcome {
            Ok(Ok(())) => {
                self.observer.handler_completed(DispatchKind::Event, name);
                return Ok(());
            }
            Ok(Err(error)) => error,
            Err(payload) => Box::new(HandlerPanicked::from_payload(payload)),
        };

        self.observer
            .handler_failed(DispatchKind::Event, name, &*error);
        Err(HandlerFailure::new(name, error))
    }
}

#[async_trait]
impl EventSender for EventDispatcher {
    async fn publish_event<E: Event>(
        &self,
        event: &E,
        cancellation: Option<CancellationToken>,
    ) -> Result<(), BoxError> {
        self.dispatch(event, cancellation.unwrap_or_default())
            .await
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher").finish_non_exhaustive()
    }
}
