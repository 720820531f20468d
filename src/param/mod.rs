//! Parameter values and the merge engine
//!
//! Provides the typed values notes are made of, the semaphore tuple, the
//! per-device scheduler map and the lower-bound merge used whenever several
//! sources recommend a value for the same parameter.

pub mod merge;
pub mod scheduler;
pub mod semaphore;
pub mod value;

pub use merge::{Constraint, ConstraintSource, Resolution};
pub use scheduler::BlockDeviceSchedulers;
pub use semaphore::SemaphoreLimits;
pub use value::{
    diff, ApplyReport, LimitBound, Location, Parameter, ParameterChange, ParameterValue, SkippedResource,
};
