//! The handler resolver port.
//!
//! A [`Resolver`] maps a capability type to every instance registered for
//! it. The trait itself is object-safe and works on [`TypeId`]s; the typed
//! surface lives in [`ResolverExt`].
//!
//! # Storage convention
//!
//! An instance of capability `C` (usually a trait object such as
//! `dyn EventHandler<Ping>`) is stored as an `Arc<C>` that has itself been
//! wrapped in an outer `Arc` and upcast to [`ServiceArc`]. Resolution
//! downcasts the outer `Arc` back to `Arc<C>`:
//!
//! ```rust,ignore
//! let handler: Arc<dyn EventHandler<Ping>> = Arc::new(PingHandler);
//! let erased: ServiceArc = Arc::new(handler);
//! ```
//!
//! Resolvers are shared between concurrent dispatches and must be safe to
//! call from many tasks at once without outside locking.

use std::any::{Any, TypeId};
use std::sync::Arc;

use tracing::warn;

/// Type-erased registry entry.
///
/// The inner `dyn Any` is an `Arc<C>` for the capability `C` it was
/// registered under.
pub type ServiceArc = Arc<dyn Any + Send + Sync>;

/// Wraps a capability instance into its erased registry form.
pub fn erase<C: ?Sized + Send + Sync + 'static>(instance: Arc<C>) -> ServiceArc
where
    Arc<C>: Send + Sync,
{
    Arc::new(instance)
}

/// Maps a capability type to zero or more registered instances.
pub trait Resolver: Send + Sync {
    /// Returns every instance registered under `capability`, in registration
    /// order. An unknown key yields an empty vector.
    fn resolve_erased(&self, capability: TypeId) -> Vec<ServiceArc>;

    /// Returns `true` once the registrations behind this resolver are gone.
    ///
    /// A detached resolver resolves nothing; dispatchers report it as
    /// [`ResolverDetached`](crate::ResolverDetached).
    fn is_detached(&self) -> bool {
        false
    }
}

/// Typed resolution helpers, available on every [`Resolver`].
pub trait ResolverExt: Resolver {
    /// Resolves all instances of capability `C`.
    ///
    /// Entries stored under `C`'s key that are not `Arc<C>` are skipped with a
    /// warning.
    fn resolve_all<C: ?Sized + 'static>(&self) -> Vec<Arc<C>> {
        self.resolve_erased(TypeId::of::<C>())
            .into_iter()
            .filter_map(|erased| {
                let typed = erased.downcast_ref::<Arc<C>>().map(Arc::clone);
                if typed.is_none() {
                    warn!(
                        capability = std::any::type_name::<C>(),
                        "Resolver entry has the wrong concrete type, skipping"
                    );
                }
                typed
            })
            .collect()
    }

    /// Resolves the most recently registered instance of `C`, if any.
    fn resolve_one<C: ?Sized + 'static>(&self) -> Option<Arc<C>> {
        self.resolve_all::<C>().pop()
    }
}

impl<T: Resolver + ?Sized> ResolverExt for T {}

impl<T: Resolver + ?Sized> Resolver for Arc<T> {
    fn resolve_erased(&self, capability: TypeId) -> Vec<ServiceArc> {
        (**self).resolve_erased(capability)
    }

    fn is_detached(&self) -> bool {
        (**self).is_detached()
    }
}
