//! `loginctl`-backed login source

use async_trait::async_trait;
use seat_inspect_api::PropertyBag;
use seat_inspect_source_api::{LoginSource, SourceError, SourceResult};
use seat_inspect_util::{EntityId, EntityKind};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::properties::{classify_failure, parse_listing, parse_properties};

/// Login source that queries systemd-logind through `loginctl`
pub struct LoginctlSource {
    program: String,
    closed: AtomicBool,
    calls: AtomicUsize,
}

impl LoginctlSource {
    /// Create a source; the service is first contacted by `list`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            closed: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of loginctl invocations so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn run(&self, args: &[&str]) -> SourceResult<String> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable("source already closed".into()));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        debug!(program = %self.program, args = ?args, "Running loginctl");

        let output = Command::new(&self.program)
            .args(args)
            .arg("--no-pager")
            .env("SYSTEMD_COLORS", "0")
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    SourceError::Unavailable(format!("{} not found", self.program))
                }
                std::io::ErrorKind::PermissionDenied => {
                    SourceError::PermissionDenied(format!("cannot execute {}", self.program))
                }
                _ => SourceError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let err = classify_failure(&stderr);
            debug!(args = ?args, status = ?output.status.code(), error = %err, "loginctl failed");
            return Err(err);
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl LoginSource for LoginctlSource {
    fn describe(&self) -> String {
        format!("loginctl ({})", self.program)
    }

    async fn list(&self, kind: EntityKind) -> SourceResult<Vec<EntityId>> {
        let command = format!("list-{}s", kind);
        let output = self.run(&[&command, "--no-legend"]).await?;
        Ok(parse_listing(&output))
    }

    async fn properties(&self, kind: EntityKind, id: &EntityId) -> SourceResult<PropertyBag> {
        let command = format!("show-{}", kind);
        // --all keeps empty properties, so "no seat" is distinguishable from "not reported"
        let output = self.run(&[&command, "--all", id.as_str()]).await?;
        parse_properties(kind, &output)
    }

    async fn close(&self) -> SourceResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            warn!(program = %self.program, "Login source closed twice");
        } else {
            debug!(calls = self.calls(), "Login source closed");
        }
        Ok(())
    }
}
