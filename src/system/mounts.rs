//! Mount table (`/proc/mounts`) and filesystem sizing

use super::Mounts;
use crate::error::{IoResultExt, Result, SaptuneError};
use std::path::{Path, PathBuf};
use std::process::Command;

/// One line of `/proc/mounts`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    /// Mounted device or pseudo filesystem name
    pub device: String,
    /// Mount point
    pub mount_point: PathBuf,
    /// Filesystem type
    pub fs_type: String,
    /// Mount options
    pub options: Vec<String>,
}

impl MountEntry {
    /// Parse the whitespace separated fields of one mount table line
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let device = fields.next()?;
        let mount_point = fields.next()?;
        let fs_type = fields.next()?;
        let options = fields.next().unwrap_or_default();

        Some(Self {
            device: unescape(device),
            mount_point: PathBuf::from(unescape(mount_point)),
            fs_type: fs_type.to_string(),
            options: options.split(',').filter(|o| !o.is_empty()).map(String::from).collect(),
        })
    }

    /// Value of a `key=value` mount option
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find_map(|o| o.strip_prefix(key).and_then(|rest| rest.strip_prefix('=')))
    }
}

/// `/proc/mounts` escapes blanks and backslashes as octal sequences
fn unescape(field: &str) -> String {
    field
        .replace("\\040", " ")
        .replace("\\011", "\t")
        .replace("\\012", "\n")
        .replace("\\134", "\\")
}

/// Mount table backed by a procfs mounts file
#[derive(Debug, Clone)]
pub struct ProcMounts {
    table: PathBuf,
}

impl Default for ProcMounts {
    fn default() -> Self {
        Self::new("/proc/mounts")
    }
}

impl ProcMounts {
    /// Read the mount table from `table`
    pub fn new(table: impl Into<PathBuf>) -> Self {
        Self { table: table.into() }
    }

    /// Parse all entries
    pub fn entries(&self) -> Result<Vec<MountEntry>> {
        let content = std::fs::read_to_string(&self.table).with_path(&self.table)?;
        Ok(content.lines().filter_map(MountEntry::parse).collect())
    }

    /// Entry for a mount point; the last mount over a path is the visible one
    pub fn find(&self, mount_point: &Path) -> Result<Option<MountEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| e.mount_point == mount_point)
            .last())
    }
}

impl Mounts for ProcMounts {
    fn size_mb(&self, mount_point: &Path) -> Result<Option<u64>> {
        if self.find(mount_point)?.is_none() {
            return Ok(None);
        }
        filesystem_size_mb(mount_point).map(Some)
    }

    fn remount_size(&self, mount_point: &Path, size_mb: u64) -> Result<()> {
        tracing::info!("Remounting {:?} with size {}M", mount_point, size_mb);
        let output = Command::new("mount")
            .arg("-o")
            .arg(format!("remount,size={}M", size_mb))
            .arg(mount_point)
            .output()
            .map_err(|e| SaptuneError::command("mount", e.to_string()))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(SaptuneError::command(
                "mount",
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}

#[cfg(target_os = "linux")]
fn filesystem_size_mb(mount_point: &Path) -> Result<u64> {
    let stat = nix::sys::statvfs::statvfs(mount_point)
        .map_err(|e| SaptuneError::io(mount_point, std::io::Error::from(e)))?;
    let bytes = stat.blocks().saturating_mul(stat.fragment_size());
    Ok(bytes / 1024 / 1024)
}

#[cfg(not(target_os = "linux"))]
fn filesystem_size_mb(_mount_point: &Path) -> Result<u64> {
    Err(SaptuneError::UnsupportedOperation("filesystem statistics".to_string()))
}
