//! # saptune - SAP workload tuning for Linux hosts
//!
//! saptune brings a Linux host in line with SAP's published tuning notes.
//! Every note reads the live values it cares about, computes the values the
//! note recommends and writes them back. Recommendations are merged with the
//! live value by taking the maximum, so tuning never lowers anything an
//! administrator has already raised.
//!
//! ## Features
//!
//! - **Notes**: 1275776 (kernel IPC, limits and `/dev/shm`), 1984787
//!   (`uuidd.socket`) and 2161991 (VMware guest I/O elevator)
//! - **Simulate and Verify**: diff the host against the recommendation
//! - **Revert**: values are saved before the first apply
//! - **Injected host access**: every read and write goes through [`system::Host`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use saptune::core::{Action, NoteRunner, SnapshotStore};
//! use saptune::note::registry;
//! use saptune::system::Host;
//!
//! let host = Host::local("/");
//! let notes = registry::select(&[]).unwrap();
//! let report = NoteRunner::new(&host)
//!     .with_store(SnapshotStore::new("/var/lib/saptune/saved_state"))
//!     .run(Action::Simulate, &notes);
//! report.print_summary();
//! ```
//!
//! ## Merging
//!
//! ```
//! use saptune::param::merge;
//!
//! assert_eq!(merge::max(&[4096u64, 2048, 8192]), 8192);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod error;
pub mod note;
pub mod param;
pub mod system;

// Re-export commonly used types
pub use core::{Action, NoteRunner, RunReport};
pub use error::{Result, SaptuneError};
pub use note::Note;
pub use system::Host;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use saptune::prelude::*;
    //! ```

    pub use crate::core::{Action, NoteOutcome, NoteRunner, RunReport, SnapshotStore};
    pub use crate::error::{Result, SaptuneError};
    pub use crate::note::{registry, AfterInstallation, Note, PrepareForSapEnvironments, VmwareGuestIoElevator};
    pub use crate::param::{merge, ApplyReport, Location, Parameter, ParameterValue};
    pub use crate::system::Host;
}
