//! CLI command definitions and handlers.

pub mod check;
pub mod device;

use clap::{Parser, Subcommand};

/// Capture QA - Accept or reject captures by brightness and sharpness
#[derive(Parser)]
#[command(name = "capture-qa")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared check arguments (paths, thresholds, flags).
    #[command(flatten)]
    pub check: check::CheckArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Assess images for underexposure and blur
    Check(check::CheckArgs),
    /// Show which compute device the sharpness check would use
    Device(device::DeviceArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every image was scored and accepted.
    Success = 0,
    /// At least one image was rejected as dark or blurred.
    Rejected = 1,
    /// The command failed, or an image could not be scored.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}
