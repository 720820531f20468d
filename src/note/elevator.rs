//! 2161991 - VMware vSphere configuration guidelines
//!
//! Guests on vSphere leave request ordering to the hypervisor, so every block
//! device inside the guest uses the `noop` elevator.

use super::Note;
use crate::error::{Result, SaptuneError};
use crate::param::scheduler::BlockDeviceSchedulers;
use crate::param::value::{ApplyReport, Parameter};
use crate::system::Host;
use serde::{Deserialize, Serialize};
use std::any::Any;

const ID: &str = "2161991";

/// Scheduler every device gets
pub const GUEST_ELEVATOR: &str = "noop";

/// I/O elevator of every block device in a VMware guest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmwareGuestIoElevator {
    /// Scheduler per discovered device
    pub block_device_schedulers: BlockDeviceSchedulers,
}

impl Note for VmwareGuestIoElevator {
    fn id(&self) -> &'static str {
        ID
    }

    fn name(&self) -> &'static str {
        "VMware vSphere configuration guidelines"
    }

    fn inspect(&self, host: &Host) -> Result<Box<dyn Note>> {
        let block_device_schedulers = BlockDeviceSchedulers::inspect(host.block.as_ref())
            .map_err(|e| SaptuneError::inspection(ID, "/sys/block", e))?;
        Ok(Box::new(Self { block_device_schedulers }))
    }

    fn optimise(&self, _host: &Host) -> Result<Box<dyn Note>> {
        Ok(Box::new(Self {
            block_device_schedulers: self.block_device_schedulers.optimise(GUEST_ELEVATOR),
        }))
    }

    fn apply(&self, host: &Host) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();
        self.block_device_schedulers.apply(host.block.as_ref(), &mut report)?;
        Ok(report)
    }

    fn parameters(&self) -> Vec<Parameter> {
        self.block_device_schedulers.parameters()
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
