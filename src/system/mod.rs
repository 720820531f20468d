//! Accessor layer over OS configuration surfaces
//!
//! Notes never touch `/proc`, `/sys` or `/etc` directly. They go through the
//! capability traits defined here, bundled into a [`Host`]. The Linux
//! implementations live in the submodules; tests inject fakes.

mod block;
mod limits;
mod memory;
mod mounts;
mod sysconfig;
mod sysctl;
mod systemd;

#[cfg(test)]
pub(crate) mod fake;

pub use block::{parse_scheduler_line, SysBlock};
pub use limits::{LimitEntry, LimitsConf, LimitsFile};
pub use memory::HostMemory;
pub use mounts::{MountEntry, ProcMounts};
pub use sysconfig::SysconfigFile;
pub use sysctl::ProcSysctl;
pub use systemd::Systemctl;

use crate::error::{Result, SaptuneError};
use crate::param::semaphore::{SemaphoreLimits, SYSCTL_SEM};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Kernel parameter store (sysctl)
pub trait KernelParams {
    /// Read a raw value, `None` if the key does not exist
    fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Write a raw value
    fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Read an unsigned value, falling back to `default` if the key is absent
    fn get_u64(&self, key: &str, default: u64) -> Result<u64> {
        match self.get_string(key)? {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| SaptuneError::MalformedValue {
                key: key.to_string(),
                value: raw,
            }),
        }
    }

    /// Write an unsigned value
    fn set_u64(&self, key: &str, value: u64) -> Result<()> {
        self.set_string(key, &value.to_string())
    }

    /// Read the four semaphore limits
    fn semaphore_limits(&self) -> Result<SemaphoreLimits> {
        match self.get_string(SYSCTL_SEM)? {
            Some(raw) => raw.parse(),
            None => Err(SaptuneError::NotFound(SYSCTL_SEM.to_string())),
        }
    }
}

/// PAM resource limits store (limits.conf)
pub trait SecurityLimits {
    /// Read the current limits document
    fn load(&self) -> Result<LimitsFile>;

    /// Persist a limits document; new sessions pick it up
    fn store(&self, limits: &LimitsFile) -> Result<()>;
}

/// Mount table and filesystem sizing
pub trait Mounts {
    /// Size of the filesystem mounted at `mount_point` in MB, `None` if not mounted
    fn size_mb(&self, mount_point: &Path) -> Result<Option<u64>>;

    /// Remount `mount_point` with a new size in MB
    fn remount_size(&self, mount_point: &Path, size_mb: u64) -> Result<()>;
}

/// Facts about physical memory
pub trait MemoryFacts {
    /// Total physical memory in MB
    fn total_mb(&self) -> u64;

    /// Total physical memory in pages of the native page size
    fn total_pages(&self) -> u64;
}

/// systemd unit state
pub trait Services {
    /// Whether the unit is currently active
    fn is_running(&self, unit: &str) -> Result<bool>;

    /// Enable the unit and start it now
    fn enable_start(&self, unit: &str) -> Result<()>;

    /// Disable the unit and stop it now
    fn disable_stop(&self, unit: &str) -> Result<()>;
}

/// Block devices and their I/O schedulers
pub trait BlockDevices {
    /// Active scheduler of every discovered device
    fn schedulers(&self) -> Result<BTreeMap<String, String>>;

    /// Select a scheduler; a vanished device yields `MissingResource`
    fn set_scheduler(&self, device: &str, scheduler: &str) -> Result<()>;
}

/// All capabilities a note may use, plus the root prefix for override files
pub struct Host {
    /// Prefix prepended to `/etc` paths
    pub root: PathBuf,
    /// Kernel parameters
    pub kernel: Box<dyn KernelParams>,
    /// limits.conf
    pub limits: Box<dyn SecurityLimits>,
    /// Mount table
    pub mounts: Box<dyn Mounts>,
    /// Memory facts
    pub memory: Box<dyn MemoryFacts>,
    /// systemd
    pub services: Box<dyn Services>,
    /// Block devices
    pub block: Box<dyn BlockDevices>,
}

impl Host {
    /// Accessors for the running system.
    ///
    /// `root` prefixes the files under `/etc` (limits.conf and the sysconfig
    /// overrides); `/proc` and `/sys` are always the live ones.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            kernel: Box::new(ProcSysctl::default()),
            limits: Box::new(LimitsConf::new(prefixed(&root, limits::LIMITS_CONF))),
            mounts: Box::new(ProcMounts::default()),
            memory: Box::new(HostMemory::collect()),
            services: Box::new(Systemctl::default()),
            block: Box::new(SysBlock::default()),
            root,
        }
    }

    /// Resolve an absolute configuration path below the root prefix
    pub fn path(&self, absolute: &str) -> PathBuf {
        prefixed(&self.root, absolute)
    }

    /// Load a sysconfig override file; a missing file reads as empty
    pub fn override_file(&self, absolute: &str) -> Result<SysconfigFile> {
        SysconfigFile::load_optional(&self.path(absolute))
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host").field("root", &self.root).finish_non_exhaustive()
    }
}

fn prefixed(root: &Path, absolute: &str) -> PathBuf {
    root.join(absolute.trim_start_matches('/'))
}
