//! Note orchestration
//!
//! Runs notes for the CLI actions and keeps the pre-apply snapshots
//! needed to revert them.

mod runner;
mod state;

pub use runner::*;
pub use state::*;
