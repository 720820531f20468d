//! Command line arguments and runtime settings

use crate::core::{Action, DEFAULT_STATE_DIR};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// saptune - tune a Linux host for SAP workloads
#[derive(Parser, Debug, Clone)]
#[command(name = "saptune")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tune Linux kernel, limits and services for SAP workloads")]
#[command(long_about = r#"
saptune inspects the live host, computes the values recommended by each
supported SAP note and writes them back. Values are only ever raised.

Notes:
  1275776  Linux: Preparing SLES for SAP environments
  1984787  SUSE LINUX Enterprise Server 12: Installation notes
  2161991  VMware vSphere configuration guidelines

Examples:
  saptune list                         # Known notes
  saptune simulate                     # Show what apply would change
  saptune apply 1275776 2161991        # Tune for two notes
  saptune verify --output-format json  # Check compliance
  saptune revert 1275776               # Restore the pre-tuning values
"#)]
pub struct CliArgs {
    /// Prefix for /etc paths (limits.conf, sysconfig overrides)
    #[arg(long, env = "SAPTUNE_ROOT", default_value = "/", value_name = "PATH")]
    pub root: PathBuf,

    /// Where pre-apply snapshots are kept
    #[arg(long, env = "SAPTUNE_STATE_DIR", default_value = DEFAULT_STATE_DIR, value_name = "PATH")]
    pub state_dir: PathBuf,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Output format for reports
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,

    /// Log line format
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List the supported notes
    #[command(name = "list")]
    List,

    /// Show the changes apply would make
    #[command(name = "simulate")]
    Simulate {
        /// Note ids (default: all notes)
        notes: Vec<String>,
    },

    /// Tune the host
    #[command(name = "apply")]
    Apply {
        /// Note ids (default: all notes)
        notes: Vec<String>,
    },

    /// Check whether the host is tuned; exits non-zero if not
    #[command(name = "verify")]
    Verify {
        /// Note ids (default: all notes)
        notes: Vec<String>,
    },

    /// Restore the values saved by the first apply
    #[command(name = "revert")]
    Revert {
        /// Note ids (default: all notes)
        notes: Vec<String>,
    },
}

impl Commands {
    /// Runner action and selected note ids; `None` for `list`
    pub fn action(&self) -> Option<(Action, &[String])> {
        match self {
            Commands::List => None,
            Commands::Simulate { notes } => Some((Action::Simulate, notes)),
            Commands::Apply { notes } => Some((Action::Apply, notes)),
            Commands::Verify { notes } => Some((Action::Verify, notes)),
            Commands::Revert { notes } => Some((Action::Revert, notes)),
        }
    }
}

/// Report format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human readable summary
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Log line format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Plain text
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Settings derived from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Prefix for /etc paths
    pub root: PathBuf,
    /// Snapshot directory
    pub state_dir: PathBuf,
    /// Report format
    pub output_format: OutputFormat,
    /// Suppress the report
    pub quiet: bool,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: &'static str,
    /// Log line format
    pub log_format: LogFormat,
}

impl Settings {
    /// Build settings from parsed arguments
    pub fn from_cli(args: &CliArgs) -> Self {
        let log_level = match (args.quiet, args.verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, _) => "debug",
        };

        Self {
            root: args.root.clone(),
            state_dir: args.state_dir.clone(),
            output_format: args.output_format,
            quiet: args.quiet,
            log_level,
            log_format: args.log_format,
        }
    }
}
