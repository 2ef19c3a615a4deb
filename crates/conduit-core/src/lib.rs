//! # Conduit Core
//!
//! Abstractions for the Conduit in-process mediator.
//!
//! Senders and handlers never reference each other. A sender hands a message
//! to a dispatcher; the dispatcher asks a [`Resolver`] for every handler
//! registered under the message's capability type and invokes them.
//!
//! ```text
//! ┌────────┐     ┌──────────┐     ┌─────────────────┐     ┌──────────┐
//! │ caller │────▶│ Mediator │────▶│ EventSender     │────▶│ Resolver │──▶ handlers
//! └────────┘     └──────────┘────▶│ RequestSender   │────▶│          │──▶ handler
//!                                 └─────────────────┘     └──────────┘
//! ```
//!
//! This crate defines the vocabulary only:
//!
//! - **Messages**: [`Event`], [`Request`]
//! - **Handlers**: [`EventHandler`], [`RequestHandler`]
//! - **Senders**: [`EventSender`], [`RequestSender`], [`Mediator`]
//! - **Resolution**: [`Resolver`], [`ResolverExt`]
//! - **Observability**: [`DispatchObserver`], [`NoopObserver`], [`TracingObserver`]
//! - **Errors**: [`HandlerFailure`], [`AggregateHandlerFailure`], [`NoHandlerFound`], …
//!
//! The in-memory dispatchers and registry live in `conduit-inmemory`.

pub mod error;
pub mod handler;
pub mod message;
pub mod observer;
pub mod resolver;
pub mod sender;

pub use error::{
    AggregateHandlerFailure, AmbiguousHandler, BoxError, DispatcherNotBound, HandlerFailure,
    HandlerPanicked, NoHandlerFound, ResolverDetached, short_type_name,
};
pub use handler::{EventHandler, RequestHandler};
pub use message::{Event, Request};
pub use observer::{DispatchKind, DispatchObserver, NoopObserver, TracingObserver};
pub use resolver::{Resolver, ResolverExt, ServiceArc, erase};
pub use sender::{EventSender, Mediator, RequestSender};

// Handler implementations need both of these.
pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;

/// Prelude for handler and sender implementations.
pub mod prelude {
    pub use super::{
        BoxError, CancellationToken, Event, EventHandler, EventSender, Mediator, Request,
        RequestHandler, RequestSender, async_trait,
    };
}
