//! Conduit Runtime - configuration and logging bootstrap.
//!
//! This crate provides:
//! - Layered configuration (`ConfigLoader`, `ConduitConfig`)
//! - Logging setup on `tracing-subscriber` (`LoggingBuilder`)
//! - `ConduitRuntime`, which turns a configuration into a pre-wired
//!   `RegistryBuilder`
//!
//! ```ignore
//! use conduit_runtime::ConduitRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = ConduitRuntime::new()?;
//!     runtime.init_logging()?;
//!
//!     let registry = runtime
//!         .registry_builder()
//!         .add_request_handler::<Whoami, _>(WhoamiHandler)?
//!         .build();
//!
//!     let identity = registry.mediator().unwrap().send(Whoami).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConduitConfig, ConfigError, ConfigLoader, ConfigResult, MediatorConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{ConduitRuntime, ConduitRuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;
