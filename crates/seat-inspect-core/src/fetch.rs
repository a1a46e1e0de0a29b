//! Entity fetching
//!
//! Enumerates every seat, session and user, then queries each object's
//! properties with a bounded number of concurrent requests. Enumeration
//! failures abort the run; a failed detail query only degrades that object
//! to a bare record.

use seat_inspect_api::{AttrValue, PartialFetch, RawRecord, Snapshot};
use seat_inspect_config::FetchSettings;
use seat_inspect_source_api::{LoginSource, ProcessProbe, SourceError};
use seat_inspect_util::{EntityId, EntityKind, InspectError, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Fetch tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Maximum concurrent detail queries
    pub concurrency: usize,
    /// Deadline for the whole fetch
    pub deadline: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from(&FetchSettings::default())
    }
}

impl From<&FetchSettings> for FetchOptions {
    fn from(settings: &FetchSettings) -> Self {
        Self {
            concurrency: settings.concurrency,
            deadline: settings.deadline,
        }
    }
}

pub struct EntityFetcher {
    source: Arc<dyn LoginSource>,
    probe: Option<Arc<dyn ProcessProbe>>,
    options: FetchOptions,
}

impl EntityFetcher {
    pub fn new(source: Arc<dyn LoginSource>, options: FetchOptions) -> Self {
        Self {
            source,
            probe: None,
            options,
        }
    }

    /// Probe session leaders after fetching
    pub fn with_probe(mut self, probe: Arc<dyn ProcessProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Fetch everything the source knows, bounded by the configured deadline
    pub async fn fetch_all(&self) -> Result<Snapshot> {
        let deadline = self.options.deadline;
        match tokio::time::timeout(deadline, self.fetch_unbounded()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(deadline_ms = deadline.as_millis() as u64, "Fetch deadline expired");
                Err(InspectError::unavailable(format!(
                    "deadline of {}s expired",
                    deadline.as_secs_f64()
                )))
            }
        }
    }

    async fn fetch_unbounded(&self) -> Result<Snapshot> {
        let mut snapshot = Snapshot::empty(self.source.describe());

        let mut listed = Vec::new();
        for kind in EntityKind::ALL {
            let ids = self
                .source
                .list(kind)
                .await
                .map_err(|e| listing_error(kind, e))?;
            let ids: BTreeSet<EntityId> = ids.into_iter().collect();
            info!(kind = %kind, count = ids.len(), "Enumerated objects");
            listed.push((kind, ids));
        }

        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (kind, ids) in listed {
            for id in ids {
                let source = Arc::clone(&self.source);
                let semaphore = Arc::clone(&semaphore);
                tasks.spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    let result = source.properties(kind, &id).await;
                    (kind, id, result)
                });
            }
        }

        while let Some(joined) = tasks.join_next().await {
            let (kind, id, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => return Err(InspectError::unavailable(format!("detail query cancelled: {}", e))),
            };

            let record = match result {
                Ok(attrs) => {
                    debug!(kind = %kind, id = %id, attributes = attrs.len(), "Fetched details");
                    RawRecord::new(id, attrs)
                }
                Err(e) => {
                    warn!(kind = %kind, id = %id, error = %e, "Detail query failed, keeping bare record");
                    snapshot.warnings.push(PartialFetch {
                        kind,
                        id: id.clone(),
                        cause: e.fetch_cause(),
                        message: e.to_string(),
                    });
                    RawRecord::bare(id)
                }
            };

            match kind {
                EntityKind::Seat => snapshot.seats.push(record),
                EntityKind::Session => snapshot.sessions.push(record),
                EntityKind::User => snapshot.users.push(record),
            }
        }

        // Completion order is arbitrary
        for records in [&mut snapshot.seats, &mut snapshot.sessions, &mut snapshot.users] {
            records.sort_by(|a, b| a.id.cmp(&b.id));
        }
        snapshot
            .warnings
            .sort_by(|a, b| (a.kind, &a.id).cmp(&(b.kind, &b.id)));

        if let Some(probe) = &self.probe {
            self.probe_leaders(probe.as_ref(), &mut snapshot);
        }

        info!(
            records = snapshot.record_count(),
            warnings = snapshot.warnings.len(),
            "Fetch complete"
        );

        Ok(snapshot)
    }

    fn probe_leaders(&self, probe: &dyn ProcessProbe, snapshot: &mut Snapshot) {
        let pids: BTreeSet<u32> = snapshot
            .sessions
            .iter()
            .filter_map(|record| record.attr("Leader").and_then(AttrValue::as_int))
            .filter_map(|pid| u32::try_from(pid).ok())
            .filter(|pid| *pid > 0)
            .collect();

        for pid in pids {
            let liveness = probe.probe(pid);
            debug!(pid = pid, liveness = ?liveness, "Probed session leader");
            snapshot.leaders.insert(pid, liveness);
        }
    }
}

fn listing_error(kind: EntityKind, error: SourceError) -> InspectError {
    warn!(kind = %kind, error = %error, "Enumeration failed");
    match InspectError::from(error) {
        InspectError::PermissionDenied(msg) => {
            InspectError::permission(format!("cannot list {}s: {}", kind, msg))
        }
        InspectError::ServiceUnavailable(msg) => {
            InspectError::unavailable(format!("cannot list {}s: {}", kind, msg))
        }
        other => other,
    }
}
