//! Application bootstrap.
//!
//! ```rust,ignore
//! use conduit_runtime::ConduitRuntime;
//!
//! let runtime = ConduitRuntime::builder()
//!     .config_file("config/conduit.toml")
//!     .build()?;
//! runtime.init_logging()?;
//!
//! let registry = runtime
//!     .registry_builder()
//!     .add_event_handler::<Ping, _>(PongHandler)
//!     .build();
//! let mediator = registry.mediator().expect("wired by the runtime");
//! ```

use std::path::{Path, PathBuf};

use tracing::info;

use conduit_inmemory::RegistryBuilder;

use crate::config::{ConduitConfig, ConfigLoader, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging::LoggingBuilder;

/// Validated configuration plus the wiring it implies.
#[derive(Debug, Clone)]
pub struct ConduitRuntime {
    config: ConduitConfig,
}

impl ConduitRuntime {
    /// Loads configuration from the default locations and the environment.
    pub fn new() -> RuntimeResult<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ConduitRuntimeBuilder {
        ConduitRuntimeBuilder::default()
    }

    /// Uses an already loaded configuration.
    pub fn from_config(config: ConduitConfig) -> RuntimeResult<Self> {
        validate_config(&config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ConduitConfig {
        &self.config
    }

    /// Installs the global `tracing` subscriber from `logging` settings.
    pub fn init_logging(&self) -> RuntimeResult<()> {
        LoggingBuilder::from_config(&self.config.logging)
            .try_init()
            .map_err(|e| RuntimeError::Logging(e.to_string()))
    }

    /// A registry builder with the mediator wired per `mediator` settings.
    ///
    /// Handlers are added by the caller; the duplicate request policy is
    /// already in effect for them.
    pub fn registry_builder(&self) -> RegistryBuilder {
        let mediator = &self.config.mediator;
        info!(
            dispatcher_lifetime = ?mediator.dispatcher_lifetime,
            duplicate_requests = ?mediator.duplicate_requests,
            trace_dispatch = mediator.trace_dispatch,
            "Wiring in-memory mediator"
        );

        let builder = RegistryBuilder::new()
            .duplicate_requests(mediator.duplicate_requests)
            .add_in_memory_mediator(mediator.dispatcher_lifetime);

        if mediator.trace_dispatch {
            builder.add_tracing_observer()
        } else {
            builder
        }
    }
}

/// Builder for [`ConduitRuntime`].
#[derive(Default)]
pub struct ConduitRuntimeBuilder {
    config_file: Option<PathBuf>,
    profile: Option<String>,
    search_paths: Vec<PathBuf>,
    without_env: bool,
    base: Option<ConduitConfig>,
}

impl ConduitRuntimeBuilder {
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Ignores `CONDUIT_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.without_env = true;
        self
    }

    /// Base configuration that files and environment override.
    pub fn config(mut self, config: ConduitConfig) -> Self {
        self.base = Some(config);
        self
    }

    /// Loads, validates and returns the runtime.
    pub fn build(self) -> RuntimeResult<ConduitRuntime> {
        let mut loader = ConfigLoader::new();
        if let Some(profile) = self.profile {
            loader = loader.profile(profile);
        }
        for path in self.search_paths {
            loader = loader.search_path(path);
        }
        if let Some(file) = self.config_file {
            loader = loader.file(file);
        }
        if self.without_env {
            loader = loader.without_env();
        }
        if let Some(base) = self.base {
            loader = loader.merge(base);
        }

        ConduitRuntime::from_config(loader.load()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, LogOutput, MediatorConfig};
    use conduit_core::{
        BoxError, CancellationToken, DispatchObserver, Event, EventHandler, EventSender,
        ResolverExt, async_trait,
    };
    use conduit_inmemory::{DuplicateRequestPolicy, EventDispatcher, Lifetime};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Ping;
    impl Event for Ping {}

    struct Pong;

    #[async_trait]
    impl EventHandler<Ping> for Pong {
        async fn handle_event(&self, _: &Ping, _: CancellationToken) -> Result<(), BoxError> {
            Ok(())
        }
    }

    fn runtime(mediator: MediatorConfig) -> ConduitRuntime {
        ConduitRuntime::from_config(ConduitConfig {
            mediator,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ConduitConfig::default();
        config.logging.output = LogOutput::File;
        let err = ConduitRuntime::from_config(config).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Config(ConfigError::ValidationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_registry_builder_wires_mediator() {
        let registry = runtime(MediatorConfig::default())
            .registry_builder()
            .add_event_handler::<Ping, _>(Pong)
            .build();

        let mediator = registry.mediator().unwrap();
        assert!(mediator.publish(&Ping).await.is_ok());
        assert!(registry.resolve_one::<dyn DispatchObserver>().is_none());
    }

    #[test]
    fn test_singleton_dispatchers() {
        let registry = runtime(MediatorConfig {
            dispatcher_lifetime: Lifetime::Singleton,
            ..Default::default()
        })
        .registry_builder()
        .build();

        let a = registry.resolve_one::<EventDispatcher>().unwrap();
        let b = registry.resolve_one::<EventDispatcher>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_trace_dispatch_registers_observer() {
        let registry = runtime(MediatorConfig {
            trace_dispatch: true,
            ..Default::default()
        })
        .registry_builder()
        .build();

        assert!(registry.resolve_one::<dyn DispatchObserver>().is_some());
    }

    #[test]
    fn test_duplicate_policy_applies_to_added_handlers() {
        use conduit_core::{Request, RequestHandler};

        struct Whoami;
        impl Request for Whoami {
            type Response = ();
        }

        struct Answer;

        #[async_trait]
        impl RequestHandler<Whoami> for Answer {
            async fn handle_request(&self, _: Whoami, _: CancellationToken) -> Result<(), BoxError> {
                Ok(())
            }
        }

        let rejecting = runtime(MediatorConfig::default())
            .registry_builder()
            .add_request_handler::<Whoami, _>(Answer)
            .unwrap()
            .add_request_handler::<Whoami, _>(Answer);
        assert!(rejecting.is_err());

        let replacing = runtime(MediatorConfig {
            duplicate_requests: DuplicateRequestPolicy::ReplaceWithLast,
            ..Default::default()
        })
        .registry_builder()
        .add_request_handler::<Whoami, _>(Answer)
        .unwrap()
        .add_request_handler::<Whoami, _>(Answer);
        assert!(replacing.is_ok());
    }
}
