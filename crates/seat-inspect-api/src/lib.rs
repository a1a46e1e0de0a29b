//! Plain data types for seat-inspect
//!
//! This crate defines the data exchanged between the pipeline stages and
//! with the outside world:
//! - Raw records and snapshots (fetcher output)
//! - Findings (checker output)
//! - The versioned report record format (for scripting)

mod findings;
mod report;
mod types;

pub use findings::*;
pub use report::*;
pub use types::*;

/// Current report format version
pub const REPORT_VERSION: u32 = 1;
