//! Source traits

use async_trait::async_trait;
use seat_inspect_api::{FetchCause, Liveness, PropertyBag};
use seat_inspect_util::{EntityId, EntityKind, InspectError};
use thiserror::Error;

/// Errors from source operations
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Unexpected service reply: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// How a failed detail query is recorded in a partial fetch warning
    pub fn fetch_cause(&self) -> FetchCause {
        match self {
            SourceError::PermissionDenied(_) => FetchCause::PermissionDenied,
            SourceError::NotFound(_) => FetchCause::NotFound,
            _ => FetchCause::Failed,
        }
    }
}

impl From<SourceError> for InspectError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::PermissionDenied(msg) => InspectError::PermissionDenied(msg),
            other => InspectError::ServiceUnavailable(other.to_string()),
        }
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Read-only access to the login/seat service.
///
/// A source is a handle: whoever opens it passes it explicitly to the
/// fetcher and calls [`LoginSource::close`] when the run is over.
#[async_trait]
pub trait LoginSource: Send + Sync {
    /// Human-readable description, used in logs and reports
    fn describe(&self) -> String;

    /// List the identifiers of every object of the given kind
    async fn list(&self, kind: EntityKind) -> SourceResult<Vec<EntityId>>;

    /// Read the property bag of one object
    async fn properties(&self, kind: EntityKind, id: &EntityId) -> SourceResult<PropertyBag>;

    /// Release the handle; no queries may follow
    async fn close(&self) -> SourceResult<()> {
        Ok(())
    }
}

/// Checks whether a process still exists
pub trait ProcessProbe: Send + Sync {
    fn probe(&self, pid: u32) -> Liveness;
}
