//! systemd unit state through `systemctl`

use super::Services;
use crate::error::{Result, SaptuneError};
use std::process::{Command, Output};

/// Service control backed by the `systemctl` binary
#[derive(Debug, Clone)]
pub struct Systemctl {
    program: String,
}

impl Default for Systemctl {
    fn default() -> Self {
        Self::new("systemctl")
    }
}

impl Systemctl {
    /// Use a specific systemctl binary
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        tracing::debug!("{} {}", self.program, args.join(" "));
        Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| SaptuneError::command(&self.program, format!("cannot run: {}", e)))
    }

    fn run_checked(&self, args: &[&str]) -> Result<()> {
        let output = self.run(args)?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(SaptuneError::command(
            format!("{} {}", self.program, args.join(" ")),
            if stderr.is_empty() {
                format!("exit code {}", output.status.code().unwrap_or(-1))
            } else {
                stderr
            },
        ))
    }
}

impl Services for Systemctl {
    fn is_running(&self, unit: &str) -> Result<bool> {
        // is-active exits non-zero for every state except "active"
        Ok(self.run(&["is-active", "--quiet", unit])?.status.success())
    }

    fn enable_start(&self, unit: &str) -> Result<()> {
        tracing::info!("Enabling and starting {}", unit);
        self.run_checked(&["enable", unit])?;
        self.run_checked(&["start", unit])
    }

    fn disable_stop(&self, unit: &str) -> Result<()> {
        tracing::info!("Disabling and stopping {}", unit);
        self.run_checked(&["disable", unit])?;
        self.run_checked(&["stop", unit])
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status_maps_to_running() {
        assert!(Systemctl::new("true").is_running("uuidd.socket").unwrap());
        assert!(!Systemctl::new("false").is_running("uuidd.socket").unwrap());
    }

    #[test]
    fn test_failed_command_is_reported() {
        let err = Systemctl::new("false").enable_start("uuidd.socket").unwrap_err();
        assert!(matches!(err, SaptuneError::Command { ref program, .. } if program == "false enable uuidd.socket"));
    }

    #[test]
    fn test_missing_binary_is_reported() {
        let err = Systemctl::new("/nonexistent/systemctl").is_running("uuidd.socket").unwrap_err();
        assert!(matches!(err, SaptuneError::Command { .. }));
    }
}
