//! # Conduit
//!
//! An in-process mediator. Senders publish events and send requests without
//! knowing who handles them:
//!
//! - an **event** reaches every handler registered for its type, all running
//!   concurrently; the publisher gets back every failure at once.
//! - a **request** reaches exactly one handler and returns its response.
//!
//! ```text
//! ┌────────┐     ┌──────────────────┐     ┌────────────────────┐     ┌──────────────────┐
//! │ caller │────▶│ InMemoryMediator │────▶│ EventDispatcher    │────▶│ HandlerRegistry  │──▶ handlers
//! └────────┘     └──────────────────┘────▶│ RequestDispatcher  │────▶│                  │──▶ handler
//!                                         └────────────────────┘     └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use conduit::prelude::*;
//!
//! #[derive(Debug, Clone, Event)]
//! struct Ping;
//!
//! #[derive(Debug, Request)]
//! #[request(response = String)]
//! struct Whoami;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = RegistryBuilder::new()
//!         .add_event_handler::<Ping, _>(event_handler_fn(|_: Ping, _| async {
//!             println!("pong");
//!             Ok(())
//!         }))
//!         .add_request_handler::<Whoami, _>(request_handler_fn(|_: Whoami, _| async {
//!             Ok("abc".to_string())
//!         }))?
//!         .add_in_memory_mediator(Lifetime::Transient)
//!         .build();
//!
//!     let mediator = registry.mediator().expect("registered above");
//!     mediator.publish(&Ping).await?;
//!     assert_eq!(mediator.send(Whoami).await?, "abc");
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `macros` *(default)*: `#[derive(Event)]` and `#[derive(Request)]`
//! - `toml-config` *(default)* / `yaml-config`: configuration file formats
//! - `json-log`: JSON log lines

pub use conduit_core as core;
pub use conduit_inmemory as inmemory;
pub use conduit_runtime as runtime;

#[cfg(feature = "macros")]
pub use conduit_macros::{Event, Request};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use conduit::prelude::*;
/// ```
pub mod prelude {
    // Messages and handlers
    pub use conduit_core::{
        BoxError, CancellationToken, Event, EventHandler, Request, RequestHandler, async_trait,
    };

    // Senders
    pub use conduit_core::{EventSender, Mediator, RequestSender};

    // Errors callers match on
    pub use conduit_core::{AggregateHandlerFailure, HandlerFailure, NoHandlerFound};

    // In-memory wiring
    pub use conduit_inmemory::{
        DuplicateRequestPolicy, HandlerRegistry, InMemoryMediator, Lifetime, RegistryBuilder,
        event_handler_fn, request_handler_fn,
    };

    // Bootstrap
    pub use conduit_runtime::ConduitRuntime;

    #[cfg(feature = "macros")]
    pub use conduit_macros::{Event, Request};
}
