//! Registration errors.

use thiserror::Error;

/// Errors raised while building a [`HandlerRegistry`](crate::HandlerRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A second handler was registered for a request type under
    /// [`DuplicateRequestPolicy::Reject`](crate::DuplicateRequestPolicy::Reject).
    #[error(
        "request handler for {request_type} already registered ({existing}); refusing {rejected}"
    )]
    DuplicateRequestHandler {
        /// The request type.
        request_type: &'static str,
        /// Implementation that was registered first.
        existing: &'static str,
        /// Implementation that was refused.
        rejected: &'static str,
    },
}

/// Result type for registration operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
