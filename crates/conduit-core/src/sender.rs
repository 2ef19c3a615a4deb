//! Caller-facing dispatch traits.
//!
//! [`EventSender`] and [`RequestSender`] are the two roles a dispatcher can
//! play; [`Mediator`] is anything that plays both. Code that only publishes
//! events should depend on `EventSender`, code that needs both on `Mediator`.
//!
//! The methods are generic over the message type, so these traits are used
//! through generics (`impl Mediator`, `M: Mediator`) rather than as trait
//! objects.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;
use crate::message::{Event, Request};

/// Publishes events to every registered handler.
#[async_trait]
pub trait EventSender: Send + Sync {
    /// Publishes `event` and waits for all of its handlers.
    ///
    /// Succeeds when no handler is registered. When any handler fails the
    /// error is an [`AggregateHandlerFailure`](crate::AggregateHandlerFailure)
    /// holding every failure of this call.
    ///
    /// `cancellation` is passed to each handler; `None` means a token that is
    /// never cancelled.
    async fn publish_event<E: Event>(
        &self,
        event: &E,
        cancellation: Option<CancellationToken>,
    ) -> Result<(), BoxError>;

    /// [`publish_event`](Self::publish_event) without a cancellation token.
    async fn publish<E: Event>(&self, event: &E) -> Result<(), BoxError> {
        self.publish_event(event, None).await
    }
}

/// Sends requests to their single registered handler.
#[async_trait]
pub trait RequestSender: Send + Sync {
    /// Sends `request` and returns its handler's response.
    ///
    /// Fails with [`NoHandlerFound`](crate::NoHandlerFound) when no handler is
    /// registered. A handler's own error is returned unchanged.
    async fn send_request<R: Request>(
        &self,
        request: R,
        cancellation: Option<CancellationToken>,
    ) -> Result<R::Response, BoxError>;

    /// [`send_request`](Self::send_request) without a cancellation token.
    async fn send<R: Request>(&self, request: R) -> Result<R::Response, BoxError> {
        self.send_request(request, None).await
    }
}

/// Convenience bound for types that are both senders.
pub trait Mediator: EventSender + RequestSender {}

impl<T: EventSender + RequestSender + ?Sized> Mediator for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Ping;
    impl Event for Ping {}

    struct Whoami;
    impl Request for Whoami {
        type Response = &'static str;
    }

    /// Records whether each call carried a token.
    #[derive(Default)]
    struct Recording(Mutex<Vec<bool>>);

    #[async_trait]
    impl EventSender for Recording {
        async fn publish_event<E: Event>(
            &self,
            _: &E,
            cancellation: Option<CancellationToken>,
        ) -> Result<(), BoxError> {
            self.0.lock().unwrap().push(cancellation.is_some());
            Ok(())
        }
    }

    #[async_trait]
    impl RequestSender for Recording {
        async fn send_request<R: Request>(
            &self,
            _: R,
            cancellation: Option<CancellationToken>,
        ) -> Result<R::Response, BoxError> {
            self.0.lock().unwrap().push(cancellation.is_some());
            Err("unanswered".into())
        }
    }

    async fn via_mediator<M: Mediator>(mediator: &M) -> Result<&'static str, BoxError> {
        mediator.publish(&Ping).await?;
        mediator.send(Whoami).await
    }

    #[tokio::test]
    async fn test_shorthands_pass_no_token() {
        let sender = Recording::default();
        sender
            .publish_event(&Ping, Some(CancellationToken::new()))
            .await
            .unwrap();

        let err = via_mediator(&sender).await.unwrap_err();
        assert_eq!(err.to_string(), "unanswered");
        assert_eq!(*sender.0.lock().unwrap(), vec![true, false, false]);
    }
}
