//! Check command - assess images for underexposure and blur.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use capture_qa_adapters::FsImageSource;
use capture_qa_core::compute::{Backend, ComputePipeline, CpuPipeline};
use capture_qa_core::{
    AnalysisResult, BackendPreference, FeatureConfig, ImageInfo, ImageLoadError, ImageSource,
    LuminanceConfig,
    ProgressEvent, ProgressSink, QualityAssessor, QualityObserver, QualityVerdict, ReadbackMode,
    ResultOutput, SharpnessConfig,
};
use clap::{Args, ValueEnum};
use tracing::{debug, info, warn};

use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{JsonOutput, ProgressBar};

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    #[default]
    Jsonl,
    /// Single JSON array
    Json,
}

/// Parse and validate a dark threshold (mean luma, 0-255).
fn parse_dark_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (0.0..=255.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0.0..=255.0"))
    }
}

/// Parse and validate a blur threshold (Laplacian variance, non-negative).
fn parse_blur_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} must be a finite number >= 0"))
    }
}

/// Shared arguments for image assessment.
#[derive(Args, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct CheckArgs {
    /// Files or directories to assess
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Disable the brightness (underexposure) check
    #[arg(long)]
    pub no_brightness: bool,

    /// Disable the blur check
    ///
    /// The blur check only runs while the brightness check is disabled.
    #[arg(long)]
    pub no_blur: bool,

    /// Mean luma below which an image is dark (0-255)
    #[arg(long, value_parser = parse_dark_threshold)]
    pub dark_threshold: Option<f64>,

    /// Laplacian variance at or below which an image is blurred
    #[arg(long, value_parser = parse_blur_threshold)]
    pub blur_threshold: Option<f64>,

    /// Compute backend for the blur check: auto, gpu or cpu
    #[arg(long, value_name = "BACKEND")]
    pub backend: Option<BackendPreference>,

    /// Approximate the 8-bit sharpness readback of older capture builds
    #[arg(long)]
    pub legacy_readback: bool,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,
}

impl CheckArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    ///
    /// For boolean flags: CLI `--no-*` always wins. Config can enable/disable
    /// only when CLI flag wasn't explicitly set.
    #[must_use]
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if !args.recursive {
            args.recursive = config.general.recursive.unwrap_or(false);
        }

        if !args.no_brightness {
            if let Some(enabled) = config.brightness.enabled {
                args.no_brightness = !enabled;
            }
        }
        if !args.no_blur {
            if let Some(enabled) = config.blur.enabled {
                args.no_blur = !enabled;
            }
        }

        // Thresholds: CLI > config (accessor provides hardcoded fallback)
        args.dark_threshold = args.dark_threshold.or(config.brightness.dark_threshold);
        args.blur_threshold = args.blur_threshold.or(config.blur.threshold);

        if args.backend.is_none() {
            args.backend = config.blur.backend.as_deref().and_then(|s| s.parse().ok());
        }
        if !args.legacy_readback {
            args.legacy_readback = config
                .blur
                .readback
                .as_deref()
                .and_then(|s| s.parse::<ReadbackMode>().ok())
                == Some(ReadbackMode::Legacy);
        }

        // Output format: CLI > config (accessor provides fallback)
        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }

        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }

        args
    }

    fn features(&self) -> FeatureConfig {
        FeatureConfig::new(!self.no_brightness, !self.no_blur)
    }

    fn luminance_config(&self) -> LuminanceConfig {
        let defaults = LuminanceConfig::default();
        LuminanceConfig {
            dark_threshold: self.dark_threshold.unwrap_or(defaults.dark_threshold),
        }
    }

    fn sharpness_config(&self) -> SharpnessConfig {
        let defaults = SharpnessConfig::default();
        SharpnessConfig {
            blur_threshold: self.blur_threshold.unwrap_or(defaults.blur_threshold),
            readback: if self.legacy_readback {
                ReadbackMode::Legacy
            } else {
                ReadbackMode::Full
            },
        }
    }

    /// Get output format with fallback to JSONL.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or(OutputFormat::Jsonl)
    }
}

/// Result of running the check command.
#[allow(dead_code)] // Fields exposed for programmatic use
pub struct CheckResult {
    /// Images scored and accepted.
    pub accepted: usize,
    /// Images scored and rejected.
    pub rejected: usize,
    /// Images that failed to load or score.
    pub unscored: usize,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Run the check command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub fn run(args: &CheckArgs) -> Result<CheckResult> {
    info!("Running check command on {} paths", args.paths.len());

    if args.paths.is_empty() {
        anyhow::bail!("No paths specified");
    }

    let mut features = args.features();
    if features.blur_check_enabled && features.brightness_check_enabled {
        info!("Blur check skipped while the brightness check is enabled");
    }
    if !features.brightness_check_enabled && !features.blur_check_enabled {
        warn!("All checks disabled, every image will be accepted");
    }

    // Only open a device when the sharpness analyzer will actually run.
    let backend = if features.runs_blur_check() {
        let preference = args.backend.unwrap_or_default();
        match Backend::select(preference) {
            Ok(backend) => backend,
            Err(e) => {
                warn!("Blur check disabled: {e}");
                features.blur_check_enabled = false;
                Backend::Cpu(CpuPipeline::new())
            }
        }
    } else {
        Backend::Cpu(CpuPipeline::new())
    };
    debug!("Sharpness backend: {}", backend.name());

    let assessor = QualityAssessor::new(backend, args.luminance_config(), args.sharpness_config());

    let source = FsImageSource::new(args.paths.clone(), args.recursive);
    let total = source.count_hint();

    // Determine if we should show progress
    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress_bar = ProgressBar::new(total.map(|t| t as u64), args.quiet, show_progress);

    let output = JsonOutput::stdout();

    process_images(&source, &assessor, features, &output, &progress_bar, args)
}

/// Assess every image from `source`.
fn process_images<P: ComputePipeline>(
    source: &dyn ImageSource,
    assessor: &QualityAssessor<P>,
    features: FeatureConfig,
    output: &JsonOutput,
    progress: &dyn ProgressSink,
    args: &CheckArgs,
) -> Result<CheckResult> {
    let total = source.count_hint();
    let mut accepted = 0usize;
    let mut rejected = 0usize;
    let mut unscored = 0usize;
    let mut all_results: Vec<AnalysisResult> = Vec::new();

    for (index, image_result) in source.images().enumerate() {
        let image = match image_result {
            Ok(img) => img,
            Err(e) => {
                let result = load_failure_record(index, &e);
                progress.on_event(ProgressEvent::Skipped {
                    path: result.path.clone(),
                    reason: format!("{e:#}"),
                });
                unscored += 1;
                match args.format() {
                    OutputFormat::Jsonl => output.write(&result)?,
                    OutputFormat::Json => all_results.push(result),
                }
                continue;
            }
        };

        progress.on_event(ProgressEvent::Started {
            path: image.path.clone(),
            index,
            total,
        });

        let result = assess_image(assessor, &image, features);
        if result.is_unscored() {
            unscored += 1;
        } else if result.is_rejected() {
            rejected += 1;
        } else {
            accepted += 1;
        }

        progress.on_event(ProgressEvent::Completed {
            result: result.clone(),
        });

        match args.format() {
            OutputFormat::Jsonl => output.write(&result)?,
            OutputFormat::Json => all_results.push(result),
        }
    }

    // For JSON format, output all results as array via adapter
    if args.format() == OutputFormat::Json {
        output.write_array(&all_results, args.pretty)?;
    }

    output.flush()?;

    progress.on_event(ProgressEvent::Finished {
        accepted,
        rejected,
        unscored,
    });

    let exit_code = if unscored > 0 {
        ExitCode::Error
    } else if rejected > 0 {
        ExitCode::Rejected
    } else {
        ExitCode::Success
    };

    Ok(CheckResult {
        accepted,
        rejected,
        unscored,
        exit_code,
    })
}

/// Unscored record for an item the source could not load.
///
/// Falls back to the batch index when the source did not say which file
/// it was.
fn load_failure_record(index: usize, error: &anyhow::Error) -> AnalysisResult {
    let path = error
        .downcast_ref::<ImageLoadError>()
        .map_or_else(|| format!("image {index}"), |e| e.path.clone());
    warn!("Could not load {path}: {error:#}");
    AnalysisResult {
        path,
        timestamp: iso_timestamp(),
        dimensions: None,
        verdict: None,
        luminance: None,
        sharpness: None,
        error: Some(format!("{error:#}")),
    }
}

/// Assesses one decoded image into an output record.
///
/// A failed assessment becomes an unscored record carrying the error.
fn assess_image<P: ComputePipeline>(
    assessor: &QualityAssessor<P>,
    image: &ImageInfo,
    features: FeatureConfig,
) -> AnalysisResult {
    let observer = TraceObserver { path: &image.path };
    let mut result = AnalysisResult {
        path: image.path.clone(),
        timestamp: iso_timestamp(),
        dimensions: Some(image.dimensions()),
        verdict: None,
        luminance: None,
        sharpness: None,
        error: None,
    };

    match assessor.assess_detailed(&image.view(), features, &observer) {
        Ok(assessment) => {
            result.verdict = Some(assessment.verdict);
            result.luminance = assessment.luminance;
            result.sharpness = assessment.sharpness;
        }
        Err(e) => {
            warn!("Could not assess {}: {e}", image.path);
            result.error = Some(e.to_string());
        }
    }

    result
}

/// Logs each per-axis flag as it is reported.
struct TraceObserver<'a> {
    path: &'a str,
}

impl QualityObserver for TraceObserver<'_> {
    fn on_brightness_checked(&self, is_dark: bool) {
        debug!("{}: dark={is_dark}", self.path);
    }

    fn on_blur_checked(&self, is_blur: bool) {
        debug!("{}: blur={is_blur}", self.path);
    }

    fn on_verdict(&self, verdict: &QualityVerdict) {
        debug!("{}: acceptable={}", self.path, verdict.is_acceptable);
    }
}

/// Generate ISO 8601 UTC timestamp (RFC 3339 format).
fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}
