//! In-memory host used by unit tests

use super::{BlockDevices, Host, KernelParams, LimitsFile, MemoryFacts, Mounts, SecurityLimits, Services};
use crate::error::{Result, SaptuneError};
use crate::param::value::LimitBound;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct FakeState {
    sysctl: BTreeMap<String, String>,
    failing_sysctl: BTreeSet<String>,
    limits: LimitsFile,
    limits_unreadable: bool,
    mounts: BTreeMap<PathBuf, u64>,
    total_bytes: u64,
    services: BTreeMap<String, bool>,
    service_calls: Vec<String>,
    services_unreachable: bool,
    devices: BTreeMap<String, String>,
    devices_unreadable: bool,
    read_only_devices: BTreeSet<String>,
    writes: usize,
}

/// Shared fake system state; every accessor handed out by [`FakeSystem::host`]
/// reads and writes the same state.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeSystem {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSystem {
    pub(crate) fn new() -> Self {
        let fake = Self::default();
        fake.lock().total_bytes = 16384 * 1024 * 1024;
        fake
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn host(&self) -> Host {
        self.host_with_root("/nonexistent/saptune-root")
    }

    pub(crate) fn host_with_root(&self, root: impl Into<PathBuf>) -> Host {
        Host {
            root: root.into(),
            kernel: Box::new(self.clone()),
            limits: Box::new(self.clone()),
            mounts: Box::new(self.clone()),
            memory: Box::new(self.clone()),
            services: Box::new(self.clone()),
            block: Box::new(self.clone()),
        }
    }

    pub(crate) fn set_sysctl(&self, key: &str, value: &str) {
        self.lock().sysctl.insert(key.to_string(), value.to_string());
    }

    pub(crate) fn sysctl(&self, key: &str) -> Option<String> {
        self.lock().sysctl.get(key).cloned()
    }

    pub(crate) fn fail_sysctl_write(&self, key: &str) {
        self.lock().failing_sysctl.insert(key.to_string());
    }

    pub(crate) fn set_limit(&self, domain: &str, bound: LimitBound, value: u64) {
        self.lock().limits.set(domain, bound, "nofile", value);
    }

    pub(crate) fn limit(&self, domain: &str, bound: LimitBound) -> Option<u64> {
        self.lock().limits.get(domain, bound, "nofile")
    }

    pub(crate) fn break_limits_file(&self) {
        self.lock().limits_unreadable = true;
    }

    pub(crate) fn mount(&self, path: &str, size_mb: u64) {
        self.lock().mounts.insert(PathBuf::from(path), size_mb);
    }

    pub(crate) fn mount_size(&self, path: &str) -> Option<u64> {
        self.lock().mounts.get(Path::new(path)).copied()
    }

    pub(crate) fn set_memory_mb(&self, mb: u64) {
        self.lock().total_bytes = mb * 1024 * 1024;
    }

    pub(crate) fn set_service(&self, unit: &str, running: bool) {
        self.lock().services.insert(unit.to_string(), running);
    }

    pub(crate) fn service_running(&self, unit: &str) -> bool {
        self.lock().services.get(unit).copied().unwrap_or(false)
    }

    pub(crate) fn break_service_manager(&self) {
        self.lock().services_unreachable = true;
    }

    pub(crate) fn service_calls(&self) -> Vec<String> {
        self.lock().service_calls.clone()
    }

    pub(crate) fn add_device(&self, name: &str, scheduler: &str) {
        self.lock().devices.insert(name.to_string(), scheduler.to_string());
    }

    pub(crate) fn remove_device(&self, name: &str) {
        self.lock().devices.remove(name);
    }

    pub(crate) fn break_device_scan(&self) {
        self.lock().devices_unreadable = true;
    }

    pub(crate) fn make_device_read_only(&self, name: &str) {
        self.lock().read_only_devices.insert(name.to_string());
    }

    pub(crate) fn device(&self, name: &str) -> Option<String> {
        self.lock().devices.get(name).cloned()
    }

    /// Number of successful writes of any kind
    pub(crate) fn writes(&self) -> usize {
        self.lock().writes
    }
}

impl KernelParams for FakeSystem {
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().sysctl.get(key).cloned())
    }

    fn set_string(&self, key: &str, value: &str) -> Result<()> {
        let state = &mut *self.lock();
        if state.failing_sysctl.contains(key) {
            return Err(SaptuneError::io(
                format!("/proc/sys/{}", key.replace('.', "/")),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ));
        }
        state.sysctl.insert(key.to_string(), value.to_string());
        state.writes += 1;
        Ok(())
    }
}

impl SecurityLimits for FakeSystem {
    fn load(&self) -> Result<LimitsFile> {
        let state = self.lock();
        if state.limits_unreadable {
            return Err(SaptuneError::io(
                "/etc/security/limits.conf",
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            ));
        }
        Ok(state.limits.clone())
    }

    fn store(&self, limits: &LimitsFile) -> Result<()> {
        let state = &mut *self.lock();
        state.limits = limits.clone();
        state.writes += 1;
        Ok(())
    }
}

impl Mounts for FakeSystem {
    fn size_mb(&self, mount_point: &Path) -> Result<Option<u64>> {
        Ok(self.lock().mounts.get(mount_point).copied())
    }

    fn remount_size(&self, mount_point: &Path, size_mb: u64) -> Result<()> {
        let state = &mut *self.lock();
        match state.mounts.get_mut(mount_point) {
            Some(size) => {
                *size = size_mb;
                state.writes += 1;
                Ok(())
            }
            None => Err(SaptuneError::command("mount", format!("{:?} not mounted", mount_point))),
        }
    }
}

impl MemoryFacts for FakeSystem {
    fn total_mb(&self) -> u64 {
        self.lock().total_bytes / 1024 / 1024
    }

    fn total_pages(&self) -> u64 {
        self.lock().total_bytes / 4096
    }
}

impl Services for FakeSystem {
    fn is_running(&self, unit: &str) -> Result<bool> {
        if self.lock().services_unreachable {
            return Err(SaptuneError::command(
                format!("systemctl is-active {}", unit),
                "Failed to connect to bus",
            ));
        }
        Ok(self.service_running(unit))
    }

    fn enable_start(&self, unit: &str) -> Result<()> {
        let state = &mut *self.lock();
        state.services.insert(unit.to_string(), true);
        state.service_calls.push(format!("enable-start {}", unit));
        state.writes += 1;
        Ok(())
    }

    fn disable_stop(&self, unit: &str) -> Result<()> {
        let state = &mut *self.lock();
        state.services.insert(unit.to_string(), false);
        state.service_calls.push(format!("disable-stop {}", unit));
        state.writes += 1;
        Ok(())
    }
}

impl BlockDevices for FakeSystem {
    fn schedulers(&self) -> Result<BTreeMap<String, String>> {
        let state = self.lock();
        if state.devices_unreadable {
            return Err(SaptuneError::io(
                "/sys/block",
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            ));
        }
        Ok(state.devices.clone())
    }

    fn set_scheduler(&self, device: &str, scheduler: &str) -> Result<()> {
        let state = &mut *self.lock();
        if state.read_only_devices.contains(device) {
            return Err(SaptuneError::io(
                format!("/sys/block/{}/queue/scheduler", device),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ));
        }
        match state.devices.get_mut(device) {
            Some(current) => {
                *current = scheduler.to_string();
                state.writes += 1;
                Ok(())
            }
            None => Err(SaptuneError::MissingResource(format!("block device {}", device))),
        }
    }
}
