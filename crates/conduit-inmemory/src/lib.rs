//! # Conduit In-Memory
//!
//! The in-process implementation of the Conduit mediator:
//!
//! - [`RegistryBuilder`] / [`HandlerRegistry`]: handler registration and
//!   type-keyed resolution.
//! - [`EventDispatcher`]: concurrent fan-out with aggregated failures.
//! - [`RequestDispatcher`]: routing to exactly one handler.
//! - [`InMemoryMediator`]: the facade that resolves both dispatchers per call.
//!
//! ```rust,ignore
//! use conduit_inmemory::{Lifetime, RegistryBuilder};
//!
//! let registry = RegistryBuilder::new()
//!     .add_event_handler::<Ping, _>(PongA)
//!     .add_event_handler::<Ping, _>(PongB)
//!     .add_request_handler::<Whoami, _>(WhoamiHandler)?
//!     .add_in_memory_mediator(Lifetime::Transient)
//!     .build();
//!
//! let mediator = registry.mediator().expect("registered above");
//! mediator.publish(&Ping).await?;
//! let identity = mediator.send(Whoami).await?;
//! ```

pub mod error;
pub mod event;
pub mod handler_fn;
pub mod mediator;
pub mod registry;
pub mod request;

pub use error::{RegistryError, RegistryResult};
pub use event::EventDispatcher;
pub use handler_fn::{EventHandlerFn, RequestHandlerFn, event_handler_fn, request_handler_fn};
pub use mediator::InMemoryMediator;
pub use registry::{
    DuplicateRequestPolicy, HandlerRegistry, Lifetime, RegistryBuilder, ServiceFactory,
};
pub use request::RequestDispatcher;
