//! Message marker traits.
//!
//! - [`Event`]: a fire-and-forget notification delivered to every handler
//!   registered for its type.
//! - [`Request`]: a query routed to exactly one handler, whose response type
//!   is fixed by the request type itself.
//!
//! Both traits are usually derived:
//!
//! ```rust,ignore
//! use conduit::prelude::*;
//!
//! #[derive(Debug, Clone, Event)]
//! pub struct UserRegistered {
//!     pub user_id: u64,
//! }
//!
//! #[derive(Debug, Request)]
//! #[request(response = Identity)]
//! pub struct Whoami;
//! ```

/// A notification published to zero or more handlers.
///
/// Handlers receive the event by shared reference, so an event needs to be
/// `Sync` to be handed to several of them at once.
pub trait Event: Send + Sync + 'static {}

/// A query answered by exactly one handler.
///
/// The response type is an associated type rather than a parameter: each
/// request type has one response type and call sites never name it.
pub trait Request: Send + 'static {
    /// The value the handler produces.
    type Response: Send + 'static;
}
