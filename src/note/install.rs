//! 1984787 - SUSE LINUX Enterprise Server 12: Installation notes

use super::Note;
use crate::error::{Result, SaptuneError};
use crate::param::value::{ApplyReport, Location, Parameter};
use crate::system::Host;
use serde::{Deserialize, Serialize};
use std::any::Any;

const ID: &str = "1984787";
const UUIDD_SOCKET: &str = "uuidd.socket";

/// SAP requires the uuidd socket to be enabled and running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AfterInstallation {
    /// Whether `uuidd.socket` is (to be) running
    pub uuidd_socket: bool,
}

impl Note for AfterInstallation {
    fn id(&self) -> &'static str {
        ID
    }

    fn name(&self) -> &'static str {
        "SUSE LINUX Enterprise Server 12: Installation notes"
    }

    fn inspect(&self, host: &Host) -> Result<Box<dyn Note>> {
        let uuidd_socket = host
            .services
            .is_running(UUIDD_SOCKET)
            .map_err(|e| SaptuneError::inspection(ID, UUIDD_SOCKET, e))?;
        Ok(Box::new(Self { uuidd_socket }))
    }

    fn optimise(&self, _host: &Host) -> Result<Box<dyn Note>> {
        // Unconditional, whatever the live state is
        Ok(Box::new(Self { uuidd_socket: true }))
    }

    fn apply(&self, host: &Host) -> Result<ApplyReport> {
        let result = if self.uuidd_socket {
            host.services.enable_start(UUIDD_SOCKET)
        } else {
            host.services.disable_stop(UUIDD_SOCKET)
        };
        result.map_err(|e| e.applying(UUIDD_SOCKET))?;

        let mut report = ApplyReport::default();
        report.record(Location::unit(UUIDD_SOCKET));
        Ok(report)
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![Parameter::new(Location::unit(UUIDD_SOCKET), self.uuidd_socket)]
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
