//! Linux login source for seat-inspect
//!
//! Provides:
//! - Object enumeration and property bags via `loginctl`
//! - Typed parsing of `Key=Value` property output
//! - Session leader liveness probing with signal 0

mod loginctl;
mod process;
mod properties;

pub use loginctl::*;
pub use process::*;
pub use properties::*;
