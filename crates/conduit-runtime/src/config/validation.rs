//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{ConduitConfig, LogFormat, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &ConduitConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.output = \"file\" requires logging.file_path",
        ));
    }

    if let Some(path) = &logging.file_path
        && path.file_name().is_none()
    {
        return Err(ConfigError::validation(format!(
            "logging.file_path must name a file: {}",
            path.display()
        )));
    }

    if logging.format == LogFormat::Json && !cfg!(feature = "json-log") {
        return Err(ConfigError::validation(
            "logging.format = \"json\" requires the json-log feature",
        ));
    }

    for target in logging.filters.keys() {
        validate_filter_target(target)?;
    }

    Ok(())
}

/// A filter target is a module path such as `conduit_inmemory::event`.
fn validate_filter_target(target: &str) -> ConfigResult<()> {
    let well_formed = !target.is_empty()
        && target.split("::").all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        });

    if !well_formed {
        return Err(ConfigError::validation(format!(
            "Invalid logging filter target: {target:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogLevel;
    use std::path::PathBuf;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&ConduitConfig::default()).is_ok());
    }

    #[test]
    fn test_file_output_requires_path() {
        let mut config = ConduitConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));

        config.logging.file_path = Some(PathBuf::from("logs/conduit.log"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_filter_targets() {
        let mut config = ConduitConfig::default();
        config
            .logging
            .filters
            .insert("conduit_inmemory::event".into(), LogLevel::Trace);
        assert!(validate_config(&config).is_ok());

        config
            .logging
            .filters
            .insert("bad target=debug".into(), LogLevel::Debug);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_filter_segment_is_rejected() {
        assert!(validate_filter_target("conduit::").is_err());
        assert!(validate_filter_target("").is_err());
        assert!(validate_filter_target("conduit_core").is_ok());
    }

    #[cfg(not(feature = "json-log"))]
    #[test]
    fn test_json_format_needs_feature() {
        let mut config = ConduitConfig::default();
        config.logging.format = LogFormat::Json;
        assert!(validate_config(&config).is_err());
    }
}
