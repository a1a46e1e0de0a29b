//! Error types for seat-inspect

use thiserror::Error;

use crate::EntityKind;

/// Fatal error kinds; any of these aborts the inspection run
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("Login service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Malformed {kind} record: {message}")]
    MalformedRecord { kind: EntityKind, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl InspectError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn malformed(kind: EntityKind, msg: impl Into<String>) -> Self {
        Self::MalformedRecord {
            kind,
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable name of the error kind, reported to the user
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "ServiceUnavailable",
            Self::PermissionDenied(_) => "PermissionDenied",
            Self::MalformedRecord { .. } => "MalformedRecord",
            Self::Config(_) => "ConfigError",
        }
    }

    /// Process exit code for this error.
    ///
    /// 0 and 1 are reserved for "clean" and "warnings found", 2 for usage errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ServiceUnavailable(_) => 3,
            Self::PermissionDenied(_) => 4,
            Self::MalformedRecord { .. } => 5,
            Self::Config(_) => 6,
        }
    }
}

pub type Result<T> = std::result::Result<T, InspectError>;
