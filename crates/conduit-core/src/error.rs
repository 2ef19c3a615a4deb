//! Error types shared by every dispatcher.
//!
//! Handlers report failures as [`BoxError`]. The dispatch engine only ever
//! originates the configuration errors defined here ([`NoHandlerFound`],
//! [`AmbiguousHandler`], [`DispatcherNotBound`], [`ResolverDetached`]);
//! everything else it returns is a handler's own error, either passed
//! through untouched (requests) or collected into an
//! [`AggregateHandlerFailure`] (events).
//!
//! Callers tell the two apart by downcasting:
//!
//! ```rust,ignore
//! match mediator.send_request(Whoami, None).await {
//!     Ok(identity) => println!("{identity:?}"),
//!     Err(e) if e.is::<NoHandlerFound>() => panic!("missing registration: {e}"),
//!     Err(e) => eprintln!("handler failed: {e}"),
//! }
//! ```

use std::any::Any;
use std::fmt;

use thiserror::Error;

/// Error currency of handlers and senders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Handler failures
// =============================================================================

/// A single event handler invocation that returned an error.
#[derive(Debug, Error)]
#[error("handler `{handler}` failed: {source}")]
pub struct HandlerFailure {
    handler: &'static str,
    #[source]
    source: BoxError,
}

impl HandlerFailure {
    /// Creates a failure for the named handler.
    pub fn new(handler: &'static str, source: impl Into<BoxError>) -> Self {
        Self {
            handler,
            source: source.into(),
        }
    }

    /// Type name of the handler that failed.
    pub fn handler(&self) -> &'static str {
        self.handler
    }

    /// The error the handler returned.
    pub fn error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.source.as_ref()
    }

    /// Consumes the failure, returning the handler's original error.
    pub fn into_error(self) -> BoxError {
        self.source
    }
}

/// Every handler failure observed during one event dispatch.
///
/// Members are stored in the order the failing handlers completed. An
/// aggregate is never empty.
#[derive(Debug)]
pub struct AggregateHandlerFailure {
    event_type: &'static str,
    failures: Vec<HandlerFailure>,
}

impl AggregateHandlerFailure {
    /// Bundles the failures of one fan-out.
    ///
    /// Returns `None` when `failures` is empty, since a dispatch in which no
    /// handler failed is a success.
    pub fn new(event_type: &'static str, failures: Vec<HandlerFailure>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self {
                event_type,
                failures,
            })
        }
    }

    /// Type name of the event being published.
    pub fn event_type(&self) -> &'static str {
        self.event_type
    }

    /// The individual failures, in completion order.
    pub fn failures(&self) -> &[HandlerFailure] {
        &self.failures
    }

    /// Number of handlers that failed.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Consumes the aggregate, returning its members.
    pub fn into_failures(self) -> Vec<HandlerFailure> {
        self.failures
    }
}

impl fmt::Display for AggregateHandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} handler(s) failed while publishing {}",
            self.failures.len(),
            self.event_type
        )?;
        for (i, failure) in self.failures.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateHandlerFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|f| f as &(dyn std::error::Error + 'static))
    }
}

impl IntoIterator for AggregateHandlerFailure {
    type Item = HandlerFailure;
    type IntoIter = std::vec::IntoIter<HandlerFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.into_iter()
    }
}

/// An event handler panicked instead of returning.
///
/// The panic is caught so that sibling handlers of the same fan-out still
/// run to completion and are accounted for.
#[derive(Debug, Clone, Error)]
#[error("handler panicked: {message}")]
pub struct HandlerPanicked {
    /// The panic message, when the payload was a string.
    pub message: String,
}

impl HandlerPanicked {
    /// Builds the error from a payload caught by `catch_unwind`.
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(s) => *s,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(s) => (*s).to_string(),
                Err(_) => "non-string panic payload".to_string(),
            },
        };
        Self { message }
    }
}

// =============================================================================
// Configuration errors raised by dispatch
// =============================================================================

/// No handler is registered for a request type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no request handler registered for {request_type}")]
pub struct NoHandlerFound {
    /// Fully qualified type name of the request.
    pub request_type: &'static str,
}

impl NoHandlerFound {
    pub fn new(request_type: &'static str) -> Self {
        Self { request_type }
    }

    /// The request type name without its module path.
    pub fn short_type_name(&self) -> &'static str {
        short_type_name(self.request_type)
    }
}

/// More than one handler resolved for a request type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{count} request handlers registered for {request_type}; expected exactly one")]
pub struct AmbiguousHandler {
    /// Fully qualified type name of the request.
    pub request_type: &'static str,
    /// How many handlers resolved.
    pub count: usize,
}

/// The mediator facade could not resolve the sender it forwards to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dispatcher `{dispatcher}` is not bound in the resolver")]
pub struct DispatcherNotBound {
    /// Type name of the missing sender.
    pub dispatcher: &'static str,
}

/// A dispatcher's resolver refers to a registry that has been dropped.
///
/// Raised instead of treating the missing registrations as "no handlers".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("resolver detached from its registry while dispatching {message_type}")]
pub struct ResolverDetached {
    /// Fully qualified type name of the message being dispatched.
    pub message_type: &'static str,
}

/// Strips the module path from a `std::any::type_name` string, keeping
/// generic arguments intact.
pub fn short_type_name(full: &'static str) -> &'static str {
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("boom {0}")]
    struct Boom(u8);

    #[test]
    fn test_aggregate_rejects_empty() {
        assert!(AggregateHandlerFailure::new("Ping", Vec::new()).is_none());
    }

    #[test]
    fn test_aggregate_display_lists_members() {
        let aggregate = AggregateHandlerFailure::new(
            "app::Ping",
            vec![
                HandlerFailure::new("app::A", Boom(1)),
                HandlerFailure::new("app::B", Boom(2)),
            ],
        )
        .unwrap();

        let text = aggregate.to_string();
        assert!(text.starts_with("2 handler(s) failed while publishing app::Ping"));
        assert!(text.contains("handler `app::A` failed: boom 1"));
        assert!(text.contains("handler `app::B` failed: boom 2"));
    }

    #[test]
    fn test_handler_failure_keeps_original_error() {
        let failure = HandlerFailure::new("app::A", Boom(7));
        assert!(failure.error().is::<Boom>());
        let original = failure.into_error().downcast::<Boom>().unwrap();
        assert_eq!(original.0, 7);
    }

    #[test]
    fn test_panic_payload_messages() {
        let from_str = HandlerPanicked::from_payload(Box::new("static"));
        assert_eq!(from_str.message, "static");

        let from_string = HandlerPanicked::from_payload(Box::new(String::from("owned")));
        assert_eq!(from_string.message, "owned");

        let other = HandlerPanicked::from_payload(Box::new(42u32));
        assert_eq!(other.message, "non-string panic payload");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("app::requests::Whoami"), "Whoami");
        assert_eq!(short_type_name("Whoami"), "Whoami");
        assert_eq!(
            short_type_name("app::Wrapper<app::Inner>"),
            "Wrapper<app::Inner>"
        );
        assert_eq!(
            NoHandlerFound::new("app::Whoami").short_type_name(),
            "Whoami"
        );
    }
}
