//! Configuration module for the Conduit runtime.
//!
//! Layered loading of [`ConduitConfig`] from defaults, files and the
//! environment, plus validation.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    ConduitConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, MediatorConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
