//! Configuration validation

use crate::schema::{RawChecksConfig, RawConfig, RawFetchConfig};
use crate::settings::MAX_CONCURRENCY;
use seat_inspect_api::Category;
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("fetch.concurrency must be between 1 and {max}, got {value}")]
    InvalidConcurrency { value: usize, max: usize },

    #[error("fetch.deadline_seconds must be greater than zero")]
    ZeroDeadline,

    #[error("fetch.loginctl cannot be empty")]
    EmptyProgram,

    #[error("Unknown check '{0}'")]
    UnknownCheck(String),

    #[error("Check '{0}' is disabled more than once")]
    DuplicateCheck(String),
}

/// Validate a raw configuration, collecting every error
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = validate_fetch(&config.fetch);
    errors.extend(validate_checks(&config.checks));
    errors
}

fn validate_fetch(fetch: &RawFetchConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(value) = fetch.concurrency
        && (value == 0 || value > MAX_CONCURRENCY)
    {
        errors.push(ValidationError::InvalidConcurrency {
            value,
            max: MAX_CONCURRENCY,
        });
    }

    if fetch.deadline_seconds == Some(0) {
        errors.push(ValidationError::ZeroDeadline);
    }

    if let Some(program) = &fetch.loginctl
        && program.trim().is_empty()
    {
        errors.push(ValidationError::EmptyProgram);
    }

    errors
}

fn validate_checks(checks: &RawChecksConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for tag in &checks.disabled {
        if Category::from_tag(tag).is_none() {
            errors.push(ValidationError::UnknownCheck(tag.clone()));
        } else if !seen.insert(tag.as_str()) {
            errors.push(ValidationError::DuplicateCheck(tag.clone()));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(fetch: RawFetchConfig, disabled: Vec<&str>) -> RawConfig {
        RawConfig {
            config_version: 1,
            fetch,
            checks: RawChecksConfig {
                disabled: disabled.into_iter().map(String::from).collect(),
            },
        }
    }

    #[test]
    fn valid_config_has_no_errors() {
        let config = config_with(
            RawFetchConfig {
                concurrency: Some(16),
                deadline_seconds: Some(5),
                ..Default::default()
            },
            vec!["closing-session"],
        );
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn fetch_bounds() {
        let config = config_with(
            RawFetchConfig {
                loginctl: Some("  ".into()),
                concurrency: Some(0),
                deadline_seconds: Some(0),
                probe_leaders: None,
            },
            vec![],
        );

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidConcurrency { value: 0, .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ZeroDeadline)));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::EmptyProgram)));
    }

    #[test]
    fn unknown_and_duplicate_checks() {
        let config = config_with(
            RawFetchConfig::default(),
            vec!["dead-session-leader", "dead-session-leader", "gremlins"],
        );

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateCheck(t) if t == "dead-session-leader")));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::UnknownCheck(t) if t == "gremlins")));
    }
}
