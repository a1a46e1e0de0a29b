//! Shared utilities for seat-inspect
//!
//! This crate provides:
//! - ID types (EntityId, EntityKind, NodeKey)
//! - The fatal error taxonomy shared by every stage
//! - Default paths for the configuration file

mod error;
mod ids;
mod paths;

pub use error::*;
pub use ids::*;
pub use paths::*;
