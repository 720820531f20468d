//! Typed parameter values and where they live on the host

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Soft or hard resource limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitBound {
    /// Soft limit, raisable by the user up to the hard limit
    Soft,
    /// Hard limit
    Hard,
}

impl LimitBound {
    /// Keyword used in limits.conf
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitBound::Soft => "soft",
            LimitBound::Hard => "hard",
        }
    }
}

impl fmt::Display for LimitBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of a parameter on the host
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
    /// Kernel parameter key, e.g. `kernel.shmmax`
    Sysctl { key: String },
    /// limits.conf entry
    Ulimit {
        domain: String,
        bound: LimitBound,
        item: String,
    },
    /// Mounted filesystem
    Mount { path: PathBuf },
    /// Block device I/O scheduler
    Device { name: String },
    /// systemd unit
    Unit { name: String },
}

impl Location {
    /// Kernel parameter location
    pub fn sysctl(key: impl Into<String>) -> Self {
        Self::Sysctl { key: key.into() }
    }

    /// limits.conf location
    pub fn ulimit(domain: impl Into<String>, bound: LimitBound, item: impl Into<String>) -> Self {
        Self::Ulimit {
            domain: domain.into(),
            bound,
            item: item.into(),
        }
    }

    /// Mount point location
    pub fn mount(path: impl Into<PathBuf>) -> Self {
        Self::Mount { path: path.into() }
    }

    /// Block device location
    pub fn device(name: impl Into<String>) -> Self {
        Self::Device { name: name.into() }
    }

    /// systemd unit location
    pub fn unit(name: impl Into<String>) -> Self {
        Self::Unit { name: name.into() }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Sysctl { key } => write!(f, "{}", key),
            Location::Ulimit { domain, bound, item } => write!(f, "{} {} {}", domain, bound, item),
            Location::Mount { path } => write!(f, "{}", path.display()),
            Location::Device { name } => write!(f, "/sys/block/{}/queue/scheduler", name),
            Location::Unit { name } => write!(f, "{}", name),
        }
    }
}

/// A typed scalar value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// Unsigned integer
    Unsigned(u64),
    /// Signed integer
    Signed(i64),
    /// Boolean flag
    Bool(bool),
    /// Short string
    Text(String),
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Unsigned(v) => write!(f, "{}", v),
            ParameterValue::Signed(v) => write!(f, "{}", v),
            ParameterValue::Bool(v) => write!(f, "{}", v),
            ParameterValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<u64> for ParameterValue {
    fn from(value: u64) -> Self {
        Self::Unsigned(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        Self::Signed(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A value bound to its location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Where the value lives
    pub location: Location,
    /// The value
    pub value: ParameterValue,
}

impl Parameter {
    /// Bind a value to a location
    pub fn new(location: Location, value: impl Into<ParameterValue>) -> Self {
        Self {
            location,
            value: value.into(),
        }
    }
}

/// Difference between a current and an expected parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterChange {
    /// Where the value lives
    pub location: Location,
    /// Value on the host, `None` if the host does not report the location
    pub current: Option<ParameterValue>,
    /// Value the note recommends
    pub expected: ParameterValue,
}

/// Compare two parameter lists by location.
///
/// Returns the entries of `expected` whose value differs from (or is absent
/// in) `current`, in the order of `expected`.
pub fn diff(current: &[Parameter], expected: &[Parameter]) -> Vec<ParameterChange> {
    expected
        .iter()
        .filter_map(|want| {
            let have = current.iter().find(|p| p.location == want.location);
            match have {
                Some(have) if have.value == want.value => None,
                _ => Some(ParameterChange {
                    location: want.location.clone(),
                    current: have.map(|p| p.value.clone()),
                    expected: want.value.clone(),
                }),
            }
        })
        .collect()
}

/// An enumerable resource skipped during apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedResource {
    /// Location that could not be written
    pub location: Location,
    /// Why it was skipped
    pub reason: String,
}

/// What an apply call wrote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Locations written, in write order
    pub written: Vec<Location>,
    /// Resources that vanished before they could be written
    pub skipped: Vec<SkippedResource>,
}

impl ApplyReport {
    /// Record a successful write
    pub fn record(&mut self, location: Location) {
        self.written.push(location);
    }

    /// Record a vanished resource
    pub fn skip(&mut self, location: Location, reason: impl ToString) {
        self.skipped.push(SkippedResource {
            location,
            reason: reason.to_string(),
        });
    }

    /// True when every parameter was written
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}
