//! Core inspection pipeline for seat-inspect
//!
//! This crate contains:
//! - Entity fetching with bounded concurrency and an overall deadline
//! - Graph building (typed nodes, dangling and inferred edges)
//! - Invariant checks producing ordered findings
//! - The presentation tree consumed by renderers

mod checks;
mod fetch;
mod graph;
mod inspect;
mod tree;

pub use checks::*;
pub use fetch::*;
pub use graph::*;
pub use inspect::*;
pub use tree::*;
