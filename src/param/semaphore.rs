//! Kernel semaphore limits (`kernel.sem`)
//!
//! The kernel exposes the four semaphore limits as one whitespace separated
//! tuple: `SEMMSL SEMMNS SEMOPM SEMMNI`. Each field is a lower bound of its
//! own and is merged independently before the tuple is written back.

use super::merge;
use crate::error::{Result, SaptuneError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kernel parameter holding the semaphore tuple
pub const SYSCTL_SEM: &str = "kernel.sem";

/// The four semaphore limits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemaphoreLimits {
    /// Maximum semaphores per set
    pub msl: u64,
    /// Maximum semaphores system wide
    pub mns: u64,
    /// Maximum operations per semop call
    pub opm: u64,
    /// Maximum number of semaphore sets
    pub mni: u64,
}

impl SemaphoreLimits {
    /// Create from the four fields
    pub const fn new(msl: u64, mns: u64, opm: u64, mni: u64) -> Self {
        Self { msl, mns, opm, mni }
    }

    /// Raise every field to at least the matching field of `floor`
    pub fn raised_to(&self, floor: &SemaphoreLimits) -> SemaphoreLimits {
        SemaphoreLimits {
            msl: merge::max(&[self.msl, floor.msl]),
            mns: merge::max(&[self.mns, floor.mns]),
            opm: merge::max(&[self.opm, floor.opm]),
            mni: merge::max(&[self.mni, floor.mni]),
        }
    }
}

impl fmt::Display for SemaphoreLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.msl, self.mns, self.opm, self.mni)
    }
}

impl FromStr for SemaphoreLimits {
    type Err = SaptuneError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || SaptuneError::MalformedValue {
            key: SYSCTL_SEM.to_string(),
            value: s.to_string(),
        };

        let fields = s
            .split_whitespace()
            .map(|field| field.parse::<u64>().map_err(|_| malformed()))
            .collect::<Result<Vec<u64>>>()?;

        match fields.as_slice() {
            [msl, mns, opm, mni] => Ok(SemaphoreLimits::new(*msl, *mns, *opm, *mni)),
            _ => Err(malformed()),
        }
    }
}
