//! Dispatch observability port.
//!
//! Dispatchers report what they are doing to a [`DispatchObserver`]. The
//! observer is purely informational: every method returns `()` and is called
//! before the outcome it describes is handed back to the caller, so an
//! observer can neither change nor suppress a result.
//!
//! Two implementations ship with the crate:
//!
//! - [`NoopObserver`], the default, does nothing.
//! - [`TracingObserver`] emits structured `tracing` events.

use std::error::Error;
use std::fmt;

use tracing::{debug, error, info};

/// Which dispatch path an observation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchKind {
    /// Multicast event publication.
    Event,
    /// Singular request/response.
    Request,
}

impl DispatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Request => "request",
        }
    }
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives best-effort notifications about dispatch activity.
///
/// All methods have empty default bodies; implement only what you need.
/// Implementations must be cheap and must not panic.
pub trait DispatchObserver: Send + Sync + 'static {
    /// A message is about to have its handlers resolved.
    fn dispatching(&self, _kind: DispatchKind, _message_type: &'static str) {}

    /// A handler is about to be invoked.
    fn handler_invoking(&self, _kind: DispatchKind, _handler: &'static str) {}

    /// A handler returned successfully.
    fn handler_completed(&self, _kind: DispatchKind, _handler: &'static str) {}

    /// A handler returned an error (or panicked, for events).
    fn handler_failed(
        &self,
        _kind: DispatchKind,
        _handler: &'static str,
        _error: &(dyn Error + Send + Sync + 'static),
    ) {
    }

    /// A request could not be routed to exactly one handler.
    fn unroutable(&self, _request_type: &'static str, _handler_count: usize) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DispatchObserver for NoopObserver {}

/// Observer that forwards notifications to `tracing`.
///
/// Levels follow their significance: resolution at `INFO`, per-handler
/// progress at `DEBUG`, failures at `ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DispatchObserver for TracingObserver {
    fn dispatching(&self, kind: DispatchKind, message_type: &'static str) {
        info!(kind = %kind, message_type, "Dispatching");
    }

    fn handler_invoking(&self, kind: DispatchKind, handler: &'static str) {
        debug!(kind = %kind, handler, "Invoking handler");
    }

    fn handler_completed(&self, kind: DispatchKind, handler: &'static str) {
        debug!(kind = %kind, handler, "Handler completed");
    }

    fn handler_failed(
        &self,
        kind: DispatchKind,
        handler: &'static str,
        error: &(dyn Error + Send + Sync + 'static),
    ) {
        error!(kind = %kind, handler, error = %error, "Handler failed");
    }

    fn unroutable(&self, request_type: &'static str, handler_count: usize) {
        error!(
            request_type,
            handler_count, "Request cannot be routed to exactly one handler"
        );
    }
}
