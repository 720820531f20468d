//! 1275776 - Linux: Preparing SLES for SAP environments
//!
//! Raises file descriptor limits for the SAP groups, sizes `/dev/shm` and the
//! System V shared memory and semaphore limits.
//!
//! Shared memory sizing combines the recommendations of two notes:
//!
//! - 1275776: `kernel.shmmax` at least 20 GB and at least the size of RAM,
//!   `kernel.shmall` at least RAM in pages, `/dev/shm` at 75% of RAM.
//! - 628131 (MaxDB/liveCache): `shmmni` of twice the segment count but at
//!   least 1024; sites with a known segment count put it into
//!   `SHM_COUNT_REF_VALUE` in the note's sysconfig file.

use super::Note;
use crate::error::{Result, SaptuneError};
use crate::param::merge::{self, Constraint};
use crate::param::semaphore::{SemaphoreLimits, SYSCTL_SEM};
use crate::param::value::{ApplyReport, LimitBound, Location, Parameter};
use crate::system::Host;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::path::Path;

const ID: &str = "1275776";

const SHM_MOUNT: &str = "/dev/shm";
const OVERRIDE_FILE: &str = "/etc/sysconfig/saptune-note-1275776";
const SHM_COUNT_KEY: &str = "SHM_COUNT_REF_VALUE";

const NOFILE: &str = "nofile";
const NOFILE_DOMAINS: [&str; 3] = ["@sapsys", "@sdba", "@dba"];
const NOFILE_FLOOR: u64 = 32800;

const SYSCTL_SHMMAX: &str = "kernel.shmmax";
const SYSCTL_SHMALL: &str = "kernel.shmall";
const SYSCTL_SHMMNI: &str = "kernel.shmmni";
const SYSCTL_MAX_MAP_COUNT: &str = "vm.max_map_count";

const SHMMAX_FLOOR: u64 = 20 * 1024 * 1024 * 1024;
const SHMMNI_FLOOR: u64 = 2048;
const MAX_MAP_COUNT_FLOOR: u64 = 2_000_000;
const SEM_FLOOR: SemaphoreLimits = SemaphoreLimits::new(1250, 256_000, 100, 8192);

const BYTES_PER_MB: u64 = 1024 * 1024;

/// nofile limits of one PAM domain; `None` when limits.conf has no entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NofileLimit {
    /// PAM domain, e.g. `@sapsys`
    pub domain: String,
    /// Soft limit
    pub soft: Option<u64>,
    /// Hard limit
    pub hard: Option<u64>,
}

/// Shared memory, semaphore and file descriptor settings for SAP workloads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareForSapEnvironments {
    /// Size of `/dev/shm` in MB
    pub shm_size_mb: u64,
    /// nofile limits per SAP domain
    pub nofile: Vec<NofileLimit>,
    /// `kernel.shmmax` in bytes
    pub shmmax: u64,
    /// `kernel.shmall` in pages
    pub shmall: u64,
    /// `kernel.shmmni`
    pub shmmni: u64,
    /// `vm.max_map_count`
    pub max_map_count: u64,
    /// `kernel.sem`
    pub sem: SemaphoreLimits,
}

impl PrepareForSapEnvironments {
    fn kernel_values(&self) -> [(&'static str, u64); 4] {
        [
            (SYSCTL_SHMMAX, self.shmmax),
            (SYSCTL_SHMALL, self.shmall),
            (SYSCTL_SHMMNI, self.shmmni),
            (SYSCTL_MAX_MAP_COUNT, self.max_map_count),
        ]
    }
}

/// Merge and log when the live value is not kept
fn raise(parameter: &str, constraints: &[Constraint]) -> u64 {
    let resolution = merge::resolve(constraints);
    if !resolution.keeps_live() {
        tracing::debug!("{}: raising to {} ({})", parameter, resolution.value, resolution.source);
    }
    resolution.value
}

fn raise_limit(domain: &str, bound: LimitBound, live: Option<u64>) -> Option<u64> {
    let parameter = Location::ulimit(domain, bound, NOFILE).to_string();
    Some(raise(
        &parameter,
        &[Constraint::live(live.unwrap_or(0)), Constraint::baseline(NOFILE_FLOOR)],
    ))
}

impl Note for PrepareForSapEnvironments {
    fn id(&self) -> &'static str {
        ID
    }

    fn name(&self) -> &'static str {
        "Linux: Preparing SLES for SAP environments"
    }

    fn inspect(&self, host: &Host) -> Result<Box<dyn Note>> {
        let shm_size_mb = host
            .mounts
            .size_mb(Path::new(SHM_MOUNT))
            .map_err(|e| SaptuneError::inspection(ID, SHM_MOUNT, e))?
            .ok_or_else(|| SaptuneError::inspection(ID, SHM_MOUNT, "not found in mount table"))?;

        let limits = host
            .limits
            .load()
            .map_err(|e| SaptuneError::inspection(ID, "limits.conf", e))?;
        let nofile = NOFILE_DOMAINS
            .iter()
            .map(|domain| NofileLimit {
                domain: domain.to_string(),
                soft: limits.get(domain, LimitBound::Soft, NOFILE),
                hard: limits.get(domain, LimitBound::Hard, NOFILE),
            })
            .collect();

        let read = |key: &str| {
            host.kernel
                .get_u64(key, 0)
                .map_err(|e| SaptuneError::inspection(ID, key, e))
        };

        Ok(Box::new(Self {
            shm_size_mb,
            nofile,
            shmmax: read(SYSCTL_SHMMAX)?,
            shmall: read(SYSCTL_SHMALL)?,
            shmmni: read(SYSCTL_SHMMNI)?,
            max_map_count: read(SYSCTL_MAX_MAP_COUNT)?,
            sem: host
                .kernel
                .semaphore_limits()
                .map_err(|e| SaptuneError::inspection(ID, SYSCTL_SEM, e))?,
        }))
    }

    fn optimise(&self, host: &Host) -> Result<Box<dyn Note>> {
        let overrides = host.override_file(OVERRIDE_FILE)?;
        let shm_count = overrides.get_u64(SHM_COUNT_KEY, 0)?;

        let total_mb = host.memory.total_mb();

        Ok(Box::new(Self {
            shm_size_mb: raise(
                SHM_MOUNT,
                &[Constraint::live(self.shm_size_mb), Constraint::formula(total_mb * 75 / 100)],
            ),
            nofile: self
                .nofile
                .iter()
                .map(|limit| NofileLimit {
                    domain: limit.domain.clone(),
                    soft: raise_limit(&limit.domain, LimitBound::Soft, limit.soft),
                    hard: raise_limit(&limit.domain, LimitBound::Hard, limit.hard),
                })
                .collect(),
            shmmax: raise(
                SYSCTL_SHMMAX,
                &[
                    Constraint::live(self.shmmax),
                    Constraint::formula(total_mb.saturating_mul(BYTES_PER_MB)),
                    Constraint::baseline(SHMMAX_FLOOR),
                ],
            ),
            shmall: raise(
                SYSCTL_SHMALL,
                &[Constraint::live(self.shmall), Constraint::formula(host.memory.total_pages())],
            ),
            shmmni: raise(
                SYSCTL_SHMMNI,
                &[
                    Constraint::live(self.shmmni),
                    Constraint::site(shm_count),
                    Constraint::baseline(SHMMNI_FLOOR),
                ],
            ),
            max_map_count: raise(
                SYSCTL_MAX_MAP_COUNT,
                &[Constraint::live(self.max_map_count), Constraint::baseline(MAX_MAP_COUNT_FLOOR)],
            ),
            sem: self.sem.raised_to(&SEM_FLOOR),
        }))
    }

    fn apply(&self, host: &Host) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();

        let shm = Location::mount(SHM_MOUNT);
        host.mounts
            .remount_size(Path::new(SHM_MOUNT), self.shm_size_mb)
            .map_err(|e| e.applying(shm.to_string()))?;
        report.record(shm);

        // limits.conf is one document: stage every entry, then write once.
        // `None` means the host had no entry, so any entry present is dropped.
        let mut limits = host.limits.load().map_err(|e| e.applying("limits.conf"))?;
        let mut staged = Vec::new();
        for limit in &self.nofile {
            for (bound, value) in [(LimitBound::Soft, limit.soft), (LimitBound::Hard, limit.hard)] {
                let location = Location::ulimit(limit.domain.as_str(), bound, NOFILE);
                match value {
                    Some(value) => {
                        limits.set(&limit.domain, bound, NOFILE, value);
                        staged.push(location);
                    }
                    None => {
                        if limits.remove(&limit.domain, bound, NOFILE) {
                            staged.push(location);
                        }
                    }
                }
            }
        }
        host.limits.store(&limits).map_err(|e| e.applying("limits.conf"))?;
        report.written.extend(staged);

        for (key, value) in self.kernel_values() {
            host.kernel.set_u64(key, value).map_err(|e| e.applying(key))?;
            report.record(Location::sysctl(key));
        }

        host.kernel
            .set_string(SYSCTL_SEM, &self.sem.to_string())
            .map_err(|e| e.applying(SYSCTL_SEM))?;
        report.record(Location::sysctl(SYSCTL_SEM));

        Ok(report)
    }

    fn parameters(&self) -> Vec<Parameter> {
        let mut params = vec![Parameter::new(Location::mount(SHM_MOUNT), self.shm_size_mb)];

        for limit in &self.nofile {
            for (bound, value) in [(LimitBound::Soft, limit.soft), (LimitBound::Hard, limit.hard)] {
                if let Some(value) = value {
                    params.push(Parameter::new(Location::ulimit(limit.domain.as_str(), bound, NOFILE), value));
                }
            }
        }

        params.extend(
            self.kernel_values()
                .into_iter()
                .map(|(key, value)| Parameter::new(Location::sysctl(key), value)),
        );
        params.push(Parameter::new(Location::sysctl(SYSCTL_SEM), self.sem.to_string()));
        params
    }

    fn snapshot(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn restore(&self, snapshot: serde_json::Value) -> Result<Box<dyn Note>> {
        Ok(Box::new(serde_json::from_value::<Self>(snapshot)?))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
