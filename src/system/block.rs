//! Block device I/O schedulers through `/sys/block`

use super::BlockDevices;
use crate::error::{IoResultExt, Result, SaptuneError};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Extract the active scheduler from a `queue/scheduler` line.
///
/// The kernel lists the available schedulers and marks the active one with
/// brackets: `noop [deadline] cfq`. A single unbracketed name is taken as is.
pub fn parse_scheduler_line(line: &str) -> Option<String> {
    let mut names = line.split_whitespace();
    let bracketed = line
        .split_whitespace()
        .find_map(|n| n.strip_prefix('[').and_then(|n| n.strip_suffix(']')));

    match bracketed {
        Some(active) => Some(active.to_string()),
        None => match (names.next(), names.next()) {
            (Some(only), None) => Some(only.to_string()),
            _ => None,
        },
    }
}

/// Block devices backed by a sysfs `block` directory
#[derive(Debug, Clone)]
pub struct SysBlock {
    base: PathBuf,
}

impl Default for SysBlock {
    fn default() -> Self {
        Self::new("/sys/block")
    }
}

impl SysBlock {
    /// Devices under `base` instead of `/sys/block`
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn scheduler_path(&self, device: &str) -> PathBuf {
        self.base.join(device).join("queue").join("scheduler")
    }
}

impl BlockDevices for SysBlock {
    fn schedulers(&self) -> Result<BTreeMap<String, String>> {
        let mut found = BTreeMap::new();

        for entry in std::fs::read_dir(&self.base).with_path(&self.base)? {
            let entry = entry.with_path(&self.base)?;
            let device = entry.file_name().to_string_lossy().to_string();
            let path = self.scheduler_path(&device);

            // Devices without a request queue (e.g. some virtual ones) have no scheduler
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(SaptuneError::io(path, e)),
            };

            match parse_scheduler_line(&content) {
                Some(active) => {
                    found.insert(device, active);
                }
                None => tracing::debug!("Ignoring unparsable scheduler list for {}: {:?}", device, content),
            }
        }

        Ok(found)
    }

    fn set_scheduler(&self, device: &str, scheduler: &str) -> Result<()> {
        let path = self.scheduler_path(device);
        if !self.base.join(device).exists() {
            return Err(SaptuneError::MissingResource(format!("block device {}", device)));
        }

        tracing::info!("Setting I/O scheduler of {} to {}", device, scheduler);
        match std::fs::write(&path, scheduler) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SaptuneError::MissingResource(format!("block device {}", device)))
            }
            Err(e) => Err(SaptuneError::io(path, e)),
        }
    }
}
