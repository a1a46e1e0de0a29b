//! Configuration parsing and validation for seat-inspect
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Fetch settings (loginctl program, fan-out, deadline, leader probing)
//! - Check selection
//! - Validation with clear error messages

mod schema;
mod settings;
mod validation;

pub use schema::*;
pub use settings::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

impl From<ConfigError> for seat_inspect_util::InspectError {
    fn from(err: ConfigError) -> Self {
        seat_inspect_util::InspectError::config(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<InspectConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load configuration, falling back to defaults when the file does not exist
pub fn load_config_or_default(path: impl AsRef<Path>) -> ConfigResult<InspectConfig> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(InspectConfig::default());
    }
    load_config(path)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<InspectConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(InspectConfig::from_raw(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use seat_inspect_api::Category;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn parse_minimal_config() {
        let config = parse_config("config_version = 1").unwrap();
        assert_eq!(config.fetch, FetchSettings::default());
        assert!(config.checks.disabled.is_empty());
    }

    #[test]
    fn parse_overrides() {
        let config = parse_config(
            r#"
            config_version = 1

            [fetch]
            concurrency = 2
            deadline_seconds = 3

            [checks]
            disabled = ["closing-session"]
            "#,
        )
        .unwrap();

        assert_eq!(config.fetch.concurrency, 2);
        assert_eq!(config.fetch.deadline, Duration::from_secs(3));
        assert!(!config.checks.is_enabled(Category::ClosingSession));
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_values() {
        let result = parse_config(
            r#"
            config_version = 1
            [checks]
            disabled = ["nope"]
            "#,
        );
        assert!(matches!(result, Err(ConfigError::ValidationFailed { errors }) if errors.len() == 1));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "config_version = 1\n[fetch]\nloginctl = \"/opt/bin/loginctl\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.fetch.loginctl, "/opt/bin/loginctl");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.fetch.concurrency, DEFAULT_CONCURRENCY);

        assert!(matches!(
            load_config(dir.path().join("absent.toml")),
            Err(ConfigError::ReadError(_))
        ));
    }
}
