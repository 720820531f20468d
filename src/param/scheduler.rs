//! Per-device I/O scheduler choice
//!
//! Unlike scalar parameters, the set of keys is only known after looking at
//! the host, and it may shrink before the values are written back.

use super::value::{ApplyReport, Location, Parameter};
use crate::error::Result;
use crate::system::BlockDevices;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scheduler name for every discovered block device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDeviceSchedulers {
    /// Device name to scheduler name
    pub scheduler_choice: BTreeMap<String, String>,
}

impl BlockDeviceSchedulers {
    /// Discover devices and their active schedulers
    pub fn inspect(devices: &dyn BlockDevices) -> Result<Self> {
        Ok(Self {
            scheduler_choice: devices.schedulers()?,
        })
    }

    /// Select `policy` for every known device
    pub fn optimise(&self, policy: &str) -> Self {
        Self {
            scheduler_choice: self
                .scheduler_choice
                .keys()
                .map(|device| (device.clone(), policy.to_string()))
                .collect(),
        }
    }

    /// Write every choice in device-name order.
    ///
    /// Devices that disappeared since inspection are recorded as skipped in
    /// `report`; any other failure stops and is returned.
    pub fn apply(&self, devices: &dyn BlockDevices, report: &mut ApplyReport) -> Result<()> {
        for (device, scheduler) in &self.scheduler_choice {
            let location = Location::device(device.as_str());
            match devices.set_scheduler(device, scheduler) {
                Ok(()) => report.record(location),
                Err(e) if e.is_missing_resource() => {
                    tracing::warn!("Skipping {}: {}", device, e);
                    report.skip(location, e);
                }
                Err(e) => return Err(e.applying(location.to_string())),
            }
        }
        Ok(())
    }

    /// One text parameter per device
    pub fn parameters(&self) -> Vec<Parameter> {
        self.scheduler_choice
            .iter()
            .map(|(device, scheduler)| Parameter::new(Location::device(device.as_str()), scheduler.as_str()))
            .collect()
    }
}
