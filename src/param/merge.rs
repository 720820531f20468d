//! Parameter merge engine
//!
//! Every constraint in this domain is a lower bound: a value already in use
//! on the host, a vendor floor, a memory-proportional minimum or a site
//! override. Merging several of them yields the smallest value that honours
//! all of them at once, which is their maximum.
//!
//! ```
//! use saptune::param::merge::{self, Constraint, ConstraintSource};
//!
//! assert_eq!(merge::max(&[1024u64, 32800]), 32800);
//!
//! let resolution = merge::resolve(&[
//!     Constraint::live(4096),
//!     Constraint::baseline(2048),
//!     Constraint::site(8192),
//! ]);
//! assert_eq!(resolution.value, 8192);
//! assert_eq!(resolution.source, ConstraintSource::SiteOverride);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Merge lower-bound constraints into the single value satisfying all of them.
///
/// # Panics
///
/// Panics if `constraints` is empty. Every caller supplies at least the live
/// value, so an empty slice is a bug at the call site.
pub fn max<T: Ord + Copy>(constraints: &[T]) -> T {
    match constraints.iter().copied().max() {
        Some(value) => value,
        None => panic!("merge requires at least one constraint"),
    }
}

/// Where a constraint comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintSource {
    /// Value currently in effect on the host
    Live,
    /// Fixed vendor-mandated floor
    Baseline,
    /// Derived from host facts such as total memory
    Formula,
    /// Read from a site-local override file
    SiteOverride,
}

impl fmt::Display for ConstraintSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintSource::Live => "live",
            ConstraintSource::Baseline => "baseline",
            ConstraintSource::Formula => "formula",
            ConstraintSource::SiteOverride => "site override",
        };
        f.write_str(name)
    }
}

/// One lower bound on a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// Origin of the bound
    pub source: ConstraintSource,
    /// The bound itself
    pub value: u64,
}

impl Constraint {
    /// Value currently in effect
    pub const fn live(value: u64) -> Self {
        Self { source: ConstraintSource::Live, value }
    }

    /// Fixed floor
    pub const fn baseline(value: u64) -> Self {
        Self { source: ConstraintSource::Baseline, value }
    }

    /// Formula over host facts
    pub const fn formula(value: u64) -> Self {
        Self { source: ConstraintSource::Formula, value }
    }

    /// Site-local override
    pub const fn site(value: u64) -> Self {
        Self { source: ConstraintSource::SiteOverride, value }
    }
}

/// Outcome of merging a set of constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Merged value
    pub value: u64,
    /// Source of the first constraint that reached the merged value
    pub source: ConstraintSource,
}

impl Resolution {
    /// True when the live value already satisfied every other constraint
    pub fn keeps_live(&self) -> bool {
        self.source == ConstraintSource::Live
    }
}

/// Merge constraints and report which one decided the result.
///
/// Ties go to the constraint supplied first, so passing the live value first
/// reports "unchanged" whenever the host already complies.
///
/// # Panics
///
/// Panics if `constraints` is empty.
pub fn resolve(constraints: &[Constraint]) -> Resolution {
    let values: Vec<u64> = constraints.iter().map(|c| c.value).collect();
    let value = max(&values);
    let source = constraints
        .iter()
        .find(|c| c.value == value)
        .map(|c| c.source)
        .unwrap_or(ConstraintSource::Live);
    Resolution { value, source }
}
