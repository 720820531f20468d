//! Physical memory facts

use super::MemoryFacts;
use serde::{Deserialize, Serialize};
use sysinfo::System;

/// Snapshot of total memory and the native page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMemory {
    /// Total physical memory in bytes
    pub total_bytes: u64,
    /// Native page size in bytes
    pub page_size: u64,
}

impl HostMemory {
    /// Collect memory facts from the running system
    pub fn collect() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();

        Self {
            total_bytes: sys.total_memory(),
            page_size: native_page_size(),
        }
    }
}

impl MemoryFacts for HostMemory {
    fn total_mb(&self) -> u64 {
        self.total_bytes / 1024 / 1024
    }

    fn total_pages(&self) -> u64 {
        self.total_bytes / self.page_size.max(1)
    }
}

#[cfg(target_os = "linux")]
fn native_page_size() -> u64 {
    procfs::page_size()
}

#[cfg(not(target_os = "linux"))]
fn native_page_size() -> u64 {
    4096
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversion() {
        let memory = HostMemory {
            total_bytes: 16384 * 1024 * 1024,
            page_size: 4096,
        };
        assert_eq!(memory.total_mb(), 16384);
        assert_eq!(memory.total_pages(), 4_194_304);
    }

    #[test]
    fn test_collect() {
        let memory = HostMemory::collect();
        assert!(memory.total_bytes > 0);
        assert!(memory.page_size >= 4096);
    }
}
