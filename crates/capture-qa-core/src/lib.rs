//! Capture QA Core - per-capture image quality pipeline
//!
//! Scores a just-taken frame on underexposure (mean BT.601 luma) and blur
//! (variance of the Laplacian) and combines both into an accept/reject
//! verdict. Sharpness runs on a GPU through candle when one is available and
//! on a rayon CPU pipeline otherwise.

pub mod compute;
pub mod domain;
pub mod modules;
pub mod ports;

pub use compute::{Backend, BackendPreference, CandlePipeline, ComputePipeline, CpuPipeline};
pub use domain::{
    AnalysisResult, Assessment, CancelToken, FeatureConfig, FeatureToggles, ImageDimensions,
    ImageInfo, ImageLoadError, ImageView, LuminanceScore, PixelFormat, QualityError,
    QualityVerdict, SharpnessScore,
};
pub use modules::{
    compute_luminance, LuminanceAnalyzer, LuminanceConfig, QualityAssessor, ReadbackMode,
    SharpnessAnalyzer, SharpnessConfig,
};
pub use ports::{
    ImageSource, NullObserver, ProgressEvent, ProgressSink, QualityObserver, ResultOutput,
};
