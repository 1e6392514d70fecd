//! Device command - report the compute backend the blur check would use.

use anyhow::{Context, Result};
use capture_qa_core::compute::{gpu_device, Backend, ComputePipeline};
use capture_qa_core::BackendPreference;
use clap::Args;
use serde::Serialize;

/// Arguments for the device command.
#[derive(Args)]
pub struct DeviceArgs {
    /// Backend preference to resolve: auto, gpu or cpu
    #[arg(long, default_value = "auto", value_name = "BACKEND")]
    pub backend: BackendPreference,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Serialize)]
struct DeviceReport {
    preference: BackendPreference,
    backend: &'static str,
    gpu_available: bool,
    metal_enabled: bool,
    cuda_enabled: bool,
}

/// Run the device command.
pub fn run(args: &DeviceArgs) -> Result<()> {
    let backend = Backend::select(args.backend)
        .with_context(|| format!("Cannot satisfy backend preference {:?}", args.backend))?;

    let report = DeviceReport {
        preference: args.backend,
        backend: backend.name(),
        gpu_available: gpu_device().is_some(),
        metal_enabled: cfg!(feature = "metal"),
        cuda_enabled: cfg!(feature = "cuda"),
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}
