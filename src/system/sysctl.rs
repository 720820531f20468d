//! Kernel parameters through `/proc/sys`

use super::KernelParams;
use crate::error::{IoResultExt, Result, SaptuneError};
use std::path::PathBuf;

/// Kernel parameter store backed by a procfs `sys` directory
#[derive(Debug, Clone)]
pub struct ProcSysctl {
    base: PathBuf,
}

impl Default for ProcSysctl {
    fn default() -> Self {
        Self::new("/proc/sys")
    }
}

impl ProcSysctl {
    /// Store rooted at `base` instead of `/proc/sys`
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// File backing a dotted key
    pub fn key_path(&self, key: &str) -> PathBuf {
        self.base.join(key.replace('.', "/"))
    }
}

impl KernelParams for ProcSysctl {
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("sysctl {} not present", key);
                Ok(None)
            }
            Err(e) => Err(SaptuneError::io(path, e)),
        }
    }

    fn set_string(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);
        tracing::info!("sysctl -w {}={}", key, value);
        std::fs::write(&path, format!("{}\n", value)).with_path(path)
    }
}
