//! In-memory handler registry.
//!
//! [`RegistryBuilder`] collects registrations; [`build`](RegistryBuilder::build)
//! freezes them into a [`HandlerRegistry`], the [`Resolver`] used by the
//! dispatchers.
//!
//! # Lifetimes
//!
//! Every factory registration carries a [`Lifetime`]:
//!
//! | Lifetime | Behaviour |
//! |----------|-----------|
//! | `Transient` | the factory runs on every resolution |
//! | `Singleton` | the factory runs once, on first resolution; the instance is shared |
//!
//! Instances registered directly (`add_instance`, `add_event_handler`, …) are
//! always shared.
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = RegistryBuilder::new()
//!     .add_event_handler::<Ping, _>(PongHandler)
//!     .add_request_handler::<Whoami, _>(WhoamiHandler)?
//!     .add_in_memory_mediator(Lifetime::Transient)
//!     .build();
//!
//! let mediator = registry.mediator().expect("mediator registered");
//! mediator.publish(&Ping).await?;
//! ```

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use conduit_core::{
    DispatchObserver, Event, EventHandler, Request, RequestHandler, Resolver, ServiceArc,
    TracingObserver, erase,
};

use crate::error::{RegistryError, RegistryResult};
use crate::event::EventDispatcher;
use crate::mediator::InMemoryMediator;
use crate::request::RequestDispatcher;

/// Instance policy for factory registrations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
    /// A new instance per resolution.
    #[default]
    Transient,
    /// One instance, created on first resolution and shared afterwards.
    Singleton,
}

/// What to do when a second handler is registered for a request type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateRequestPolicy {
    /// Refuse the registration with [`RegistryError::DuplicateRequestHandler`].
    #[default]
    Reject,
    /// Keep the existing handler and ignore the new one.
    KeepFirst,
    /// Drop the existing handler in favour of the new one.
    ReplaceWithLast,
}

/// Factory signature for registrations that need other services.
///
/// The resolver handed to the factory is the registry being built, so a
/// factory can resolve its own dependencies from it. Transient factories get
/// a handle that keeps the registry alive; singleton factories get a weak
/// one.
pub type ServiceFactory = Arc<dyn Fn(&Arc<dyn Resolver>) -> ServiceArc + Send + Sync>;

// =============================================================================
// Registration (internal)
// =============================================================================

enum Source {
    Instance(ServiceArc),
    Factory {
        lifetime: Lifetime,
        factory: ServiceFactory,
        cached: OnceLock<ServiceArc>,
    },
}

struct Registration {
    /// Implementation name, for logs and registration errors.
    implementation: &'static str,
    source: Source,
}

impl Registration {
    fn instance(implementation: &'static str, instance: ServiceArc) -> Self {
        Self {
            implementation,
            source: Source::Instance(instance),
        }
    }

    fn factory(implementation: &'static str, lifetime: Lifetime, factory: ServiceFactory) -> Self {
        Self {
            implementation,
            source: Source::Factory {
                lifetime,
                factory,
                cached: OnceLock::new(),
            },
        }
    }

    fn lifetime(&self) -> Lifetime {
        match &self.source {
            Source::Instance(_) => Lifetime::Singleton,
            Source::Factory { lifetime, .. } => *lifetime,
        }
    }

    /// Transient factories get `transient`. Singleton factories always get
    /// the weak `cached` handle, since their product lives in the registry.
    fn resolve(&self, transient: &Arc<dyn Resolver>, singleton: &Arc<dyn Resolver>) -> ServiceArc {
        match &self.source {
            Source::Instance(instance) => Arc::clone(instance),
            Source::Factory {
                lifetime: Lifetime::Transient,
                factory,
                ..
            } => factory(transient),
            Source::Factory {
                lifetime: Lifetime::Singleton,
                factory,
                cached,
            } => Arc::clone(cached.get_or_init(|| factory(singleton))),
        }
    }
}

// =============================================================================
// RegistryBuilder
// =============================================================================

/// Collects handler and service registrations.
///
/// Registrations under the same capability are resolved in the order they
/// were added.
#[derive(Default)]
pub struct RegistryBuilder {
    registrations: HashMap<TypeId, Vec<Registration>>,
    duplicate_requests: DuplicateRequestPolicy,
}

impl RegistryBuilder {
    /// Creates an empty builder that rejects duplicate request handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how duplicate request handler registrations are treated.
    ///
    /// Applies to registrations made after this call.
    pub fn duplicate_requests(mut self, policy: DuplicateRequestPolicy) -> Self {
        self.duplicate_requests = policy;
        self
    }

    // ─── Generic services ────────────────────────────────────────────────────

    /// Registers a shared instance under capability `C`.
    ///
    /// `C` is usually a trait object: `add_instance::<dyn Clock>(Arc::new(SystemClock))`.
    pub fn add_instance<C: ?Sized + Send + Sync + 'static>(mut self, instance: Arc<C>) -> Self {
        self.push::<C>(Registration::instance(type_name::<C>(), erase(instance)));
        self
    }

    /// Registers a factory under capability `C`.
    pub fn add_factory<C, F>(mut self, lifetime: Lifetime, factory: F) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(&Arc<dyn Resolver>) -> Arc<C> + Send + Sync + 'static,
    {
        let factory: ServiceFactory =
            Arc::new(move |resolver: &Arc<dyn Resolver>| erase(factory(resolver)));
        self.push::<C>(Registration::factory(type_name::<C>(), lifetime, factory));
        self
    }

    // ─── Event handlers ──────────────────────────────────────────────────────

    /// Registers a shared handler for events of type `E`.
    pub fn add_event_handler<E: Event, H: EventHandler<E>>(mut self, handler: H) -> Self {
        let handler: Arc<dyn EventHandler<E>> = Arc::new(handler);
        self.push::<dyn EventHandler<E>>(Registration::instance(
            type_name::<H>(),
            erase(handler),
        ));
        self
    }

    /// Registers a handler for events of type `E`, built by `factory` under
    /// the given lifetime.
    pub fn add_event_handler_factory<E, H, F>(mut self, lifetime: Lifetime, factory: F) -> Self
    where
        E: Event,
        H: EventHandler<E>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let factory: ServiceFactory = Arc::new(move |_: &Arc<dyn Resolver>| {
            let handler: Arc<dyn EventHandler<E>> = Arc::new(factory());
            erase(handler)
        });
        self.push::<dyn EventHandler<E>>(Registration::factory(
            type_name::<H>(),
            lifetime,
            factory,
        ));
        self
    }

    // ─── Request handlers ────────────────────────────────────────────────────

    /// Registers the shared handler for requests of type `R`.
    ///
    /// A request type has at most one handler; a second registration is
    /// treated according to the builder's [`DuplicateRequestPolicy`].
    pub fn add_request_handler<R: Request, H: RequestHandler<R>>(
        self,
        handler: H,
    ) -> RegistryResult<Self> {
        let handler: Arc<dyn RequestHandler<R>> = Arc::new(handler);
        self.push_request_handler::<R>(Registration::instance(type_name::<H>(), erase(handler)))
    }

    /// Registers the handler for requests of type `R`, built by `factory`
    /// under the given lifetime.
    pub fn add_request_handler_factory<R, H, F>(
        self,
        lifetime: Lifetime,
        factory: F,
    ) -> RegistryResult<Self>
    where
        R: Request,
        H: RequestHandler<R>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let factory: ServiceFactory = Arc::new(move |_: &Arc<dyn Resolver>| {
            let handler: Arc<dyn RequestHandler<R>> = Arc::new(factory());
            erase(handler)
        });
        self.push_request_handler::<R>(Registration::factory(type_name::<H>(), lifetime, factory))
    }

    fn push_request_handler<R: Request>(
        mut self,
        registration: Registration,
    ) -> RegistryResult<Self> {
        let key = TypeId::of::<dyn RequestHandler<R>>();
        let request_type = type_name::<R>();

        if let Some(existing) = self.registrations.get(&key).and_then(|v| v.first()) {
            let existing = existing.implementation;
            match self.duplicate_requests {
                DuplicateRequestPolicy::Reject => {
                    return Err(RegistryError::DuplicateRequestHandler {
                        request_type,
                        existing,
                        rejected: registration.implementation,
                    });
                }
                DuplicateRequestPolicy::KeepFirst => {
                    warn!(
                        request_type,
                        kept = existing,
                        ignored = registration.implementation,
                        "Duplicate request handler ignored"
                    );
                    return Ok(self);
                }
                DuplicateRequestPolicy::ReplaceWithLast => {
                    warn!(
                        request_type,
                        replaced = existing,
                        replacement = registration.implementation,
                        "Duplicate request handler replaces the existing one"
                    );
                    self.registrations.remove(&key);
                }
            }
        }

        self.push::<dyn RequestHandler<R>>(registration);
        Ok(self)
    }

    // ─── Mediator wiring ─────────────────────────────────────────────────────

    /// Registers [`EventDispatcher`], [`RequestDispatcher`] and
    /// [`InMemoryMediator`], all built from this registry.
    ///
    /// The dispatchers pick up a registered [`DispatchObserver`] when they are
    /// constructed, so register the observer with the same or a longer
    /// lifetime than the dispatchers.
    pub fn add_in_memory_mediator(self, lifetime: Lifetime) -> Self {
        self.add_factory::<EventDispatcher, _>(lifetime, |resolver| {
            Arc::new(EventDispatcher::from_resolver(resolver))
        })
        .add_factory::<RequestDispatcher, _>(lifetime, |resolver| {
            Arc::new(RequestDispatcher::from_resolver(resolver))
        })
        .add_factory::<InMemoryMediator, _>(lifetime, |resolver| {
            Arc::new(InMemoryMediator::new(Arc::clone(resolver)))
        })
    }

    /// Registers [`TracingObserver`] as the dispatch observer.
    pub fn add_tracing_observer(self) -> Self {
        self.add_instance::<dyn DispatchObserver>(Arc::new(TracingObserver))
    }

    /// Number of registrations, across all capabilities.
    pub fn len(&self) -> usize {
        self.registrations.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freezes the registrations into a resolver.
    pub fn build(self) -> Arc<HandlerRegistry> {
        debug!(
            registrations = self.len(),
            capabilities = self.registrations.len(),
            "Handler registry built"
        );
        let registrations = self.registrations;
        Arc::new_cyclic(|weak| HandlerRegistry {
            registrations,
            this: weak.clone(),
            weak_handle: Arc::new(RegistryHandle(weak.clone())),
        })
    }

    fn push<C: ?Sized + 'static>(&mut self, registration: Registration) {
        debug!(
            capability = type_name::<C>(),
            implementation = registration.implementation,
            lifetime = ?registration.lifetime(),
            "Registered"
        );
        self.registrations
            .entry(TypeId::of::<C>())
            .or_default()
            .push(registration);
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("registrations", &self.len())
            .field("duplicate_requests", &self.duplicate_requests)
            .finish()
    }
}

// =============================================================================
// HandlerRegistry
// =============================================================================

/// Frozen set of registrations; the in-memory [`Resolver`].
///
/// Resolution takes no locks beyond the one-time initialisation of singleton
/// instances, so a registry can serve any number of concurrent dispatches.
///
/// Resolver handles come in two strengths:
///
/// - [`handle`](Self::handle), [`mediator`](Self::mediator) and transient
///   factories get a strong handle that keeps the registry alive.
/// - Singleton factories get a weak handle, because their product is cached
///   inside the registry. A singleton dispatcher kept past the registry's
///   drop fails with [`ResolverDetached`](conduit_core::ResolverDetached).
pub struct HandlerRegistry {
    registrations: HashMap<TypeId, Vec<Registration>>,
    this: Weak<HandlerRegistry>,
    weak_handle: Arc<dyn Resolver>,
}

impl HandlerRegistry {
    /// A mediator bound to this registry.
    ///
    /// Returns `None` unless [`InMemoryMediator`] was registered (see
    /// [`RegistryBuilder::add_in_memory_mediator`]). The mediator holds the
    /// registry, so `builder.build().mediator()` is usable on its own.
    pub fn mediator(self: &Arc<Self>) -> Option<Arc<InMemoryMediator>> {
        if self.count::<InMemoryMediator>() == 0 {
            return None;
        }
        Some(Arc::new(InMemoryMediator::new(self.handle())))
    }

    /// A resolver handle onto this registry that keeps it alive.
    pub fn handle(self: &Arc<Self>) -> Arc<dyn Resolver> {
        Arc::<Self>::clone(self)
    }

    /// Number of registrations under capability `C`.
    pub fn count<C: ?Sized + 'static>(&self) -> usize {
        self.registrations
            .get(&TypeId::of::<C>())
            .map_or(0, Vec::len)
    }

    fn resolve_with(&self, capability: TypeId, transient: &Arc<dyn Resolver>) -> Vec<ServiceArc> {
        self.registrations
            .get(&capability)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| entry.resolve(transient, &self.weak_handle))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Resolver for HandlerRegistry {
    fn resolve_erased(&self, capability: TypeId) -> Vec<ServiceArc> {
        match self.this.upgrade() {
            Some(strong) => {
                let strong: Arc<dyn Resolver> = strong;
                self.resolve_with(capability, &strong)
            }
            None => self.resolve_with(capability, &self.weak_handle),
        }
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("capabilities", &self.registrations.len())
            .finish_non_exhaustive()
    }
}

/// Weak resolver handle given to singleton factories.
///
/// Everything resolved through it is built with the weak handle too, so a
/// cached singleton never ends up owning its registry.
struct RegistryHandle(Weak<HandlerRegistry>);

impl Resolver for RegistryHandle {
    fn resolve_erased(&self, capability: TypeId) -> Vec<ServiceArc> {
        match self.0.upgrade() {
            Some(registry) => registry.resolve_with(capability, &registry.weak_handle),
            None => {
                warn!("Resolving from a handler registry that has been dropped");
                Vec::new()
            }
        }
    }

    fn is_detached(&self) -> bool {
        self.0.strong_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::{BoxError, CancellationToken, ResolverExt, async_trait};
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Clock: Send + Sync {
        fn now(&self) -> u64;
    }

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now(&self) -> u64 {
            self.0
        }
    }

    struct Tick;
    impl Event for Tick {}

    struct Noop;

    #[async_trait]
    impl EventHandler<Tick> for Noop {
        async fn handle_event(&self, _: &Tick, _: CancellationToken) -> Result<(), BoxError> {
            Ok(())
        }
    }

    struct Query;
    impl Request for Query {
        type Response = u32;
    }

    struct Answer(u32);

    #[async_trait]
    impl RequestHandler<Query> for Answer {
        async fn handle_request(&self, _: Query, _: CancellationToken) -> Result<u32, BoxError> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_instance_is_shared() {
        let registry = RegistryBuilder::new()
            .add_instance::<dyn Clock>(Arc::new(FixedClock(7)))
            .build();

        let a = registry.resolve_one::<dyn Clock>().unwrap();
        let b = registry.resolve_one::<dyn Clock>().unwrap();
        assert_eq!(a.now(), 7);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_transient_factory_runs_per_resolution() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);

        let registry = RegistryBuilder::new()
            .add_factory::<dyn Clock, _>(Lifetime::Transient, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Arc::new(FixedClock(1))
            })
            .build();

        let a = registry.resolve_one::<dyn Clock>().unwrap();
        let b = registry.resolve_one::<dyn Clock>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_singleton_factory_runs_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);

        let registry = RegistryBuilder::new()
            .add_factory::<dyn Clock, _>(Lifetime::Singleton, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Arc::new(FixedClock(1))
            })
            .build();

        let a = registry.resolve_one::<dyn Clock>().unwrap();
        let b = registry.resolve_one::<dyn Clock>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_factory_resolves_dependencies_from_registry() {
        let registry = RegistryBuilder::new()
            .add_instance::<dyn Clock>(Arc::new(FixedClock(40)))
            .add_factory::<FixedClock, _>(Lifetime::Transient, |resolver| {
                let base = resolver.resolve_one::<dyn Clock>().map_or(0, |c| c.now());
                Arc::new(FixedClock(base + 2))
            })
            .build();

        assert_eq!(registry.resolve_one::<FixedClock>().unwrap().now(), 42);
    }

    #[test]
    fn test_event_handlers_accumulate() {
        let registry = RegistryBuilder::new()
            .add_event_handler::<Tick, _>(Noop)
            .add_event_handler_factory::<Tick, _, _>(Lifetime::Transient, || Noop)
            .build();

        assert_eq!(registry.count::<dyn EventHandler<Tick>>(), 2);
        assert_eq!(registry.resolve_all::<dyn EventHandler<Tick>>().len(), 2);
    }

    #[test]
    fn test_duplicate_request_handler_rejected_by_default() {
        let err = RegistryBuilder::new()
            .add_request_handler::<Query, _>(Answer(1))
            .unwrap()
            .add_request_handler::<Query, _>(Answer(2))
            .unwrap_err();

        match err {
            RegistryError::DuplicateRequestHandler {
                request_type,
                existing,
                rejected,
            } => {
                assert!(request_type.ends_with("Query"));
                assert!(existing.ends_with("Answer"));
                assert!(rejected.ends_with("Answer"));
            }
        }
    }

    #[test]
    fn test_duplicate_request_handler_keep_first() {
        let registry = RegistryBuilder::new()
            .duplicate_requests(DuplicateRequestPolicy::KeepFirst)
            .add_request_handler::<Query, _>(Answer(1))
            .unwrap()
            .add_request_handler::<Query, _>(Answer(2))
            .unwrap()
            .build();

        assert_eq!(registry.count::<dyn RequestHandler<Query>>(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_request_handler_replace_with_last() {
        let registry = RegistryBuilder::new()
            .duplicate_requests(DuplicateRequestPolicy::ReplaceWithLast)
            .add_request_handler::<Query, _>(Answer(1))
            .unwrap()
            .add_request_handler::<Query, _>(Answer(2))
            .unwrap()
            .build();

        let handlers = registry.resolve_all::<dyn RequestHandler<Query>>();
        assert_eq!(handlers.len(), 1);
        let answer = handlers[0]
            .handle_request(Query, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(answer, 2);
    }

    struct Holder(Arc<dyn Resolver>);

    #[test]
    fn test_handle_keeps_registry_alive() {
        let registry = RegistryBuilder::new()
            .add_instance::<dyn Clock>(Arc::new(FixedClock(1)))
            .build();
        let handle = registry.handle();
        drop(registry);

        assert!(!handle.is_detached());
        assert_eq!(handle.resolve_all::<dyn Clock>().len(), 1);
    }

    #[test]
    fn test_transient_product_keeps_registry_alive() {
        let registry = RegistryBuilder::new()
            .add_instance::<dyn Clock>(Arc::new(FixedClock(1)))
            .add_factory::<Holder, _>(Lifetime::Transient, |resolver| {
                Arc::new(Holder(Arc::clone(resolver)))
            })
            .build();
        let holder = registry.resolve_one::<Holder>().unwrap();
        let weak = Arc::downgrade(&registry);
        drop(registry);

        assert!(weak.upgrade().is_some());
        assert_eq!(holder.0.resolve_all::<dyn Clock>().len(), 1);
    }

    #[test]
    fn test_singleton_product_detaches_when_registry_dropped() {
        let registry = RegistryBuilder::new()
            .add_instance::<dyn Clock>(Arc::new(FixedClock(1)))
            .add_factory::<Holder, _>(Lifetime::Singleton, |resolver| {
                Arc::new(Holder(Arc::clone(resolver)))
            })
            .build();
        let holder = registry.resolve_one::<Holder>().unwrap();
        assert!(!holder.0.is_detached());
        assert_eq!(holder.0.resolve_all::<dyn Clock>().len(), 1);

        let weak = Arc::downgrade(&registry);
        drop(registry);

        assert!(weak.upgrade().is_none());
        assert!(holder.0.is_detached());
        assert!(holder.0.resolve_all::<dyn Clock>().is_empty());
    }

    #[test]
    fn test_mediator_requires_registration() {
        assert!(RegistryBuilder::new().build().mediator().is_none());
        assert!(
            RegistryBuilder::new()
                .add_in_memory_mediator(Lifetime::Singleton)
                .build()
                .mediator()
                .is_some()
        );
    }

    #[test]
    fn test_builder_len() {
        let builder = RegistryBuilder::new();
        assert!(builder.is_empty());
        let builder = builder
            .add_event_handler::<Tick, _>(Noop)
            .add_instance::<dyn Clock>(Arc::new(FixedClock(0)));
        assert_eq!(builder.len(), 2);
    }
}
