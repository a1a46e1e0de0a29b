//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// How the login service is queried
    #[serde(default)]
    pub fetch: RawFetchConfig,

    /// Which invariant checks run
    #[serde(default)]
    pub checks: RawChecksConfig,
}

/// Fetch settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawFetchConfig {
    /// loginctl program (name or path)
    pub loginctl: Option<String>,

    /// Maximum concurrent per-object queries
    pub concurrency: Option<usize>,

    /// Overall deadline for the whole fetch, in seconds
    pub deadline_seconds: Option<u64>,

    /// Probe session leader PIDs for liveness
    pub probe_leaders: Option<bool>,
}

/// Check settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawChecksConfig {
    /// Rule tags to skip, e.g. "closing-session"
    #[serde(default)]
    pub disabled: Vec<String>,
}
