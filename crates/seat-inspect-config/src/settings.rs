//! Validated settings structures

use crate::schema::{RawChecksConfig, RawConfig, RawFetchConfig};
use seat_inspect_api::Category;
use std::collections::BTreeSet;
use std::time::Duration;

/// Default loginctl program, resolved through PATH
pub const DEFAULT_LOGINCTL: &str = "loginctl";

/// Default number of concurrent per-object queries
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Upper bound on concurrent per-object queries
pub const MAX_CONCURRENCY: usize = 64;

/// Default overall fetch deadline
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// Validated configuration ready for use by the inspector
#[derive(Debug, Clone, Default)]
pub struct InspectConfig {
    pub fetch: FetchSettings,
    pub checks: CheckSettings,
}

impl InspectConfig {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            fetch: FetchSettings::from_raw(raw.fetch),
            checks: CheckSettings::from_raw(raw.checks),
        }
    }
}

/// How the login service is queried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub loginctl: String,
    pub concurrency: usize,
    pub deadline: Duration,
    pub probe_leaders: bool,
}

impl FetchSettings {
    fn from_raw(raw: RawFetchConfig) -> Self {
        Self {
            loginctl: raw.loginctl.unwrap_or_else(|| DEFAULT_LOGINCTL.to_string()),
            concurrency: raw.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
            deadline: raw
                .deadline_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_DEADLINE),
            probe_leaders: raw.probe_leaders.unwrap_or(true),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self::from_raw(RawFetchConfig::default())
    }
}

/// Which invariant checks run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckSettings {
    pub disabled: BTreeSet<Category>,
}

impl CheckSettings {
    fn from_raw(raw: RawChecksConfig) -> Self {
        // Unknown tags were rejected by validation
        let disabled = raw
            .disabled
            .iter()
            .filter_map(|tag| Category::from_tag(tag))
            .collect();
        Self { disabled }
    }

    pub fn is_enabled(&self, category: Category) -> bool {
        !self.disabled.contains(&category)
    }
}
