//! Closure-based handlers.
//!
//! For handlers with no state worth naming, a closure is enough:
//!
//! ```rust,ignore
//! let registry = RegistryBuilder::new()
//!     .add_event_handler::<Ping, _>(event_handler_fn(|ping: Ping, _ct| async move {
//!         info!(?ping, "pong");
//!         Ok(())
//!     }))
//!     .add_request_handler::<Whoami, _>(request_handler_fn(|_: Whoami, _ct| async {
//!         Ok(Identity { id: "abc".into() })
//!     }))?
//!     .build();
//! ```
//!
//! Event closures take the event by value, so the event type must be `Clone`.

use std::any::type_name;
use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use conduit_core::{BoxError, Event, EventHandler, Request, RequestHandler};

/// An [`EventHandler`] backed by a closure. See [`event_handler_fn`].
pub struct EventHandlerFn<F, E> {
    f: F,
    name: &'static str,
    _event: PhantomData<fn(E)>,
}

/// Wraps `f` as an event handler.
pub fn event_handler_fn<E, F, Fut>(f: F) -> EventHandlerFn<F, E>
where
    E: Event + Clone,
    F: Fn(E, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    EventHandlerFn {
        f,
        name: type_name::<F>(),
        _event: PhantomData,
    }
}

impl<F, E> EventHandlerFn<F, E> {
    /// Overrides the name reported in failures and logs.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

#[async_trait]
impl<E, F, Fut> EventHandler<E> for EventHandlerFn<F, E>
where
    E: Event + Clone,
    F: Fn(E, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn handle_event(&self, event: &E, ct: CancellationToken) -> Result<(), BoxError> {
        (self.f)(event.clone(), ct).await
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// A [`RequestHandler`] backed by a closure. See [`request_handler_fn`].
pub struct RequestHandlerFn<F, R> {
    f: F,
    name: &'static str,
    _request: PhantomData<fn(R)>,
}

/// Wraps `f` as a request handler.
pub fn request_handler_fn<R, F, Fut>(f: F) -> RequestHandlerFn<F, R>
where
    R: Request,
    F: Fn(R, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R::Response, BoxError>> + Send + 'static,
{
    RequestHandlerFn {
        f,
        name: type_name::<F>(),
        _request: PhantomData,
    }
}

impl<F, R> RequestHandlerFn<F, R> {
    /// Overrides the name reported in logs.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

#[async_trait]
impl<R, F, Fut> RequestHandler<R> for RequestHandlerFn<F, R>
where
    R: Request,
    F: Fn(R, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R::Response, BoxError>> + Send + 'static,
{
    async fn handle_request(
        &self,
        request: R,
        ct: CancellationToken,
    ) -> Result<R::Response, BoxError> {
        (self.f)(request, ct).await
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventDispatcher;
    use crate::registry::RegistryBuilder;
    use crate::request::RequestDispatcher;
    use conduit_core::{AggregateHandlerFailure, EventSender, RequestSender};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Clone)]
    struct Deposit(u32);
    impl Event for Deposit {}

    struct Double(u32);
    impl Request for Double {
        type Response = u32;
    }

    #[tokio::test]
    async fn test_event_closure() {
        let total = Arc::new(AtomicU32::new(0));
        let sink = Arc::clone(&total);
        let registry = RegistryBuilder::new()
            .add_event_handler::<Deposit, _>(event_handler_fn(move |d: Deposit, _| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.fetch_add(d.0, Ordering::SeqCst);
                    Ok::<_, BoxError>(())
                }
            }))
            .build();

        let dispatcher = EventDispatcher::new(registry.handle());
        dispatcher.publish(&Deposit(3)).await.unwrap();
        dispatcher.publish(&Deposit(4)).await.unwrap();
        assert_eq!(total.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn test_named_closure_appears_in_failure() {
        let registry = RegistryBuilder::new()
            .add_event_handler::<Deposit, _>(
                event_handler_fn(|_: Deposit, _| async { Err::<(), BoxError>("declined".into()) })
                    .named("ledger"),
            )
            .build();

        let err = EventDispatcher::new(registry.handle())
            .publish(&Deposit(1))
            .await
            .unwrap_err();
        let aggregate = err.downcast::<AggregateHandlerFailure>().unwrap();
        assert_eq!(aggregate.failures()[0].handler(), "ledger");
    }

    #[tokio::test]
    async fn test_request_closure() {
        let registry = RegistryBuilder::new()
            .add_request_handler::<Double, _>(request_handler_fn(|r: Double, _| async move {
                Ok::<_, BoxError>(r.0 * 2)
            }))
            .unwrap()
            .build();

        let dispatcher = RequestDispatcher::new(registry.handle());
        assert_eq!(dispatcher.send(Double(21)).await.unwrap(), 42);
    }
}
