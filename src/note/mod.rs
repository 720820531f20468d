//! Tuning notes
//!
//! A note is one vendor recommendation. Each note goes through three phases,
//! and every phase returns a new instance instead of changing the receiver:
//!
//! 1. [`Note::inspect`] reads what the host currently has,
//! 2. [`Note::optimise`] computes what the host should have,
//! 3. [`Note::apply`] writes the instance's values to the host.
//!
//! ```no_run
//! use saptune::note::{Note, PrepareForSapEnvironments};
//! use saptune::system::Host;
//!
//! let host = Host::local("/");
//! let inspected = PrepareForSapEnvironments::default().inspect(&host).unwrap();
//! let optimised = inspected.optimise(&host).unwrap();
//! let report = optimised.apply(&host).unwrap();
//! println!("{} parameters written", report.written.len());
//! ```

mod elevator;
mod install;
mod prepare;
pub mod registry;

pub use elevator::VmwareGuestIoElevator;
pub use install::AfterInstallation;
pub use prepare::PrepareForSapEnvironments;
pub use registry::{all_notes, select};

use crate::error::Result;
use crate::param::{ApplyReport, Parameter};
use crate::system::Host;
use std::any::Any;
use std::fmt;

/// One vendor recommendation with an inspect/optimise/apply lifecycle
pub trait Note: fmt::Debug + Send + Sync {
    /// Vendor note number, used for selection and state files
    fn id(&self) -> &'static str;

    /// Human readable title
    fn name(&self) -> &'static str;

    /// Read the live values from the host into a new instance.
    ///
    /// Fails as a whole if any required value cannot be read.
    fn inspect(&self, host: &Host) -> Result<Box<dyn Note>>;

    /// Compute the recommended values from this instance.
    ///
    /// Never writes to the host; may read one override file.
    fn optimise(&self, host: &Host) -> Result<Box<dyn Note>>;

    /// Write this instance's values in declaration order.
    ///
    /// Stops at the first failed write without undoing earlier ones.
    fn apply(&self, host: &Host) -> Result<ApplyReport>;

    /// Values of this instance in declaration order
    fn parameters(&self) -> Vec<Parameter>;

    /// Serialize this instance for later restore
    fn snapshot(&self) -> Result<serde_json::Value>;

    /// Rebuild an instance of this note from [`Note::snapshot`] output
    fn restore(&self, snapshot: serde_json::Value) -> Result<Box<dyn Note>>;

    /// Access the concrete note
    fn as_any(&self) -> &dyn Any;
}
