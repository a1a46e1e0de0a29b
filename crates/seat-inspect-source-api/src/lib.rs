//! Login service source interfaces for seat-inspect
//!
//! This crate defines the narrow interface between the inspection core and
//! whatever actually talks to the login/seat service. It contains no
//! platform code itself.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
