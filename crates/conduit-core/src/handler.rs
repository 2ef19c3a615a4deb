//! Handler capabilities.
//!
//! Handlers are stored in a resolver under the trait-object type they
//! implement (`dyn EventHandler<E>` / `dyn RequestHandler<R>`), which is what
//! makes dispatch type-keyed without any name matching.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;
use crate::message::{Event, Request};

/// Processes events of type `E`.
///
/// Any number of handlers may be registered for one event type. They run
/// concurrently and must not rely on each other's ordering.
///
/// # Example
///
/// ```rust,ignore
/// struct AuditLog;
///
/// #[async_trait]
/// impl EventHandler<UserRegistered> for AuditLog {
///     async fn handle_event(
///         &self,
///         event: &UserRegistered,
///         _ct: CancellationToken,
///     ) -> Result<(), BoxError> {
///         info!(user_id = event.user_id, "user registered");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait EventHandler<E: Event>: Send + Sync + 'static {
    /// Handles one event.
    ///
    /// `ct` is the token supplied by the publisher (never cancelled if the
    /// publisher supplied none). Honouring it is the handler's job.
    async fn handle_event(&self, event: &E, ct: CancellationToken) -> Result<(), BoxError>;

    /// Name used in failures and logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Answers requests of type `R`.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync + 'static {
    /// Handles one request.
    ///
    /// An error returned here reaches the sender as-is.
    async fn handle_request(&self, request: R, ct: CancellationToken)
    -> Result<R::Response, BoxError>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
