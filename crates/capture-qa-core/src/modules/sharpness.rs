//! Sharpness analysis via variance of the Laplacian.
//!
//! The image is uploaded as normalized luma, filtered with [`LAPLACIAN`] and
//! reduced to mean and variance on the pipeline's device. The variance is
//! reported on the 8-bit channel scale (`variance * 255`), the scale an
//! 8-bit normalized readback texture stores.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compute::{ComputePipeline, LAPLACIAN};
use crate::domain::{CancelToken, ImageView, QualityError, SharpnessScore};

/// How the variance is read back from the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadbackMode {
    /// Keep the variance at full floating-point precision.
    #[default]
    Full,
    /// Approximates the 8-bit readback of older capture builds.
    ///
    /// The filtered response is clamped to [0, 1] and quantized to 1/255
    /// steps, as an 8-bit normalized render target stores it, and the score
    /// is then rounded through an unsigned byte read as a signed one. The
    /// clamped response caps the score at 64, so the signed wrap is kept
    /// for scores fed in from elsewhere. Only for comparing against scores
    /// recorded by those builds.
    Legacy,
}

impl ReadbackMode {
    /// Applies the score readback to a full-precision score.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    pub fn apply(self, score: f64) -> f64 {
        match self {
            Self::Full => score,
            Self::Legacy => {
                let byte = score.round().clamp(0.0, 255.0) as u8;
                f64::from(byte as i8)
            }
        }
    }
}

impl std::str::FromStr for ReadbackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!("unknown readback '{other}', expected full or legacy")),
        }
    }
}

/// Configuration for the blur check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SharpnessConfig {
    /// Scores at or below this are blurred.
    pub blur_threshold: f64,
    pub readback: ReadbackMode,
}

impl Default for SharpnessConfig {
    fn default() -> Self {
        Self {
            blur_threshold: 3.0,
            readback: ReadbackMode::Full,
        }
    }
}

/// Computes Laplacian variance on a compute pipeline.
#[derive(Debug)]
pub struct SharpnessAnalyzer<P> {
    pipeline: P,
    config: SharpnessConfig,
}

impl<P: ComputePipeline> SharpnessAnalyzer<P> {
    #[must_use]
    pub const fn new(pipeline: P, config: SharpnessConfig) -> Self {
        Self { pipeline, config }
    }

    #[must_use]
    pub const fn pipeline(&self) -> &P {
        &self.pipeline
    }

    #[must_use]
    pub const fn config(&self) -> &SharpnessConfig {
        &self.config
    }

    /// Variance of the Laplacian response.
    ///
    /// # Errors
    ///
    /// Returns [`QualityError::InvalidImage`] for a malformed view,
    /// [`QualityError::ComputeBackendUnavailable`] if the pipeline has no
    /// device and [`QualityError::ResourceAllocationFailed`] if device
    /// memory runs out.
    pub fn compute_blur_variance(
        &self,
        image: &ImageView<'_>,
    ) -> Result<SharpnessScore, QualityError> {
        self.compute_blur_variance_with_cancel(image, &CancelToken::new())
    }

    /// Like [`compute_blur_variance`](Self::compute_blur_variance), but
    /// polls `cancel` between pipeline stages.
    ///
    /// # Errors
    ///
    /// As [`compute_blur_variance`](Self::compute_blur_variance), plus
    /// [`QualityError::Cancelled`] once `cancel` is raised.
    pub fn compute_blur_variance_with_cancel(
        &self,
        image: &ImageView<'_>,
        cancel: &CancelToken,
    ) -> Result<SharpnessScore, QualityError> {
        image.validate()?;
        cancel.check()?;

        let pipeline = &self.pipeline;
        let readback = self.config.readback;
        let stats = pipeline.submit(|| {
            let texture = pipeline.upload(image)?;
            cancel.check()?;
            let mut filtered = pipeline.convolve(&texture, &LAPLACIAN)?;
            if readback == ReadbackMode::Legacy {
                filtered = pipeline.quantize_unorm8(&filtered)?;
            }
            cancel.check()?;
            pipeline.reduce_mean_variance(&filtered)
        })?;
        // The stream has finished; a late cancel still discards the result.
        cancel.check()?;

        let score = readback.apply(stats.variance * 255.0);
        debug!(
            "Laplacian variance {score:.4} on {} (mean {:.6})",
            pipeline.name(),
            stats.mean
        );
        Ok(SharpnessScore::new(score))
    }

    /// True when the score is at or below the blur threshold.
    #[must_use]
    pub fn is_blur(&self, score: SharpnessScore) -> bool {
        score.value() <= self.config.blur_threshold
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::compute::CpuPipeline;
    use crate::domain::PixelFormat;

    fn analyzer(readback: ReadbackMode) -> SharpnessAnalyzer<CpuPipeline> {
        SharpnessAnalyzer::new(
            CpuPipeline::new(),
            SharpnessConfig {
                readback,
                ..SharpnessConfig::default()
            },
        )
    }

    fn checkerboard(size: u32) -> Vec<u8> {
        (0..size)
            .flat_map(|y| (0..size).map(move |x| if (x + y) % 2 == 0 { 255u8 } else { 0 }))
            .flat_map(|v| [v, v, v])
            .collect()
    }

    #[test]
    fn test_uniform_image_scores_zero() {
        let data = vec![90u8; 32 * 32 * 3];
        let view = ImageView::packed(&data, 32, 32, PixelFormat::Rgb8);
        let analyzer = analyzer(ReadbackMode::Full);
        let score = analyzer.compute_blur_variance(&view).unwrap();
        assert!(score.value().abs() < 1e-9);
        assert!(analyzer.is_blur(score));
    }

    #[test]
    fn test_checkerboard_is_sharp() {
        let data = checkerboard(32);
        let view = ImageView::packed(&data, 32, 32, PixelFormat::Rgb8);
        let analyzer = analyzer(ReadbackMode::Full);
        let score = analyzer.compute_blur_variance(&view).unwrap();
        // Interior response is +-4, the border rows and columns +-3 or +-2.
        assert!(score.value() > 3000.0, "{}", score.value());
        assert!(!analyzer.is_blur(score));
    }

    #[test]
    fn test_blur_threshold_is_inclusive() {
        let analyzer = analyzer(ReadbackMode::Full);
        assert!(analyzer.is_blur(SharpnessScore::new(3.0)));
        assert!(!analyzer.is_blur(SharpnessScore::new(3.0001)));
        assert!(analyzer.is_blur(SharpnessScore::new(-1.0)));
    }

    #[test]
    fn test_legacy_readback() {
        assert!((ReadbackMode::Legacy.apply(2.4) - 2.0).abs() < f64::EPSILON);
        assert!((ReadbackMode::Legacy.apply(3.5) - 4.0).abs() < f64::EPSILON);
        assert!((ReadbackMode::Legacy.apply(127.0) - 127.0).abs() < f64::EPSILON);
        assert!((ReadbackMode::Legacy.apply(128.0) + 128.0).abs() < f64::EPSILON);
        assert!((ReadbackMode::Legacy.apply(4080.0) + 1.0).abs() < f64::EPSILON);
        assert!((ReadbackMode::Full.apply(4080.0) - 4080.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_legacy_readback_clamps_filtered_response() {
        // Half the clamped response is 0 and half is 1: variance 0.25.
        let data = checkerboard(16);
        let view = ImageView::packed(&data, 16, 16, PixelFormat::Rgb8);
        let analyzer = analyzer(ReadbackMode::Legacy);
        let score = analyzer.compute_blur_variance(&view).unwrap();
        assert!((score.value() - 64.0).abs() < f64::EPSILON, "{}", score.value());
        assert!(!analyzer.is_blur(score));
    }

    #[test]
    fn test_legacy_readback_drops_faint_detail() {
        // A one-level step filters to 1/255, which survives quantization,
        // so the score stays within a byte of the full readback.
        let data: Vec<u8> = (0..16u32 * 16)
            .flat_map(|i| {
                let v = if i % 16 < 8 { 100u8 } else { 101 };
                [v, v, v]
            })
            .collect();
        let view = ImageView::packed(&data, 16, 16, PixelFormat::Rgb8);
        let full = analyzer(ReadbackMode::Full).compute_blur_variance(&view).unwrap();
        let legacy = analyzer(ReadbackMode::Legacy).compute_blur_variance(&view).unwrap();
        assert!(legacy.value() >= 0.0);
        assert!((legacy.value() - full.value()).abs() <= 1.0);
    }

    #[test]
    fn test_cancelled_before_start() {
        let data = checkerboard(8);
        let view = ImageView::packed(&data, 8, 8, PixelFormat::Rgb8);
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = analyzer(ReadbackMode::Full).compute_blur_variance_with_cancel(&view, &cancel);
        assert_eq!(result, Err(QualityError::Cancelled));
    }

    #[test]
    fn test_invalid_image() {
        let view = ImageView::new(&[], 4, 0, 12, PixelFormat::Rgb8);
        assert!(matches!(
            analyzer(ReadbackMode::Full).compute_blur_variance(&view),
            Err(QualityError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_parse_readback() {
        assert_eq!("legacy".parse(), Ok(ReadbackMode::Legacy));
        assert_eq!("full".parse(), Ok(ReadbackMode::Full));
        assert!("byte".parse::<ReadbackMode>().is_err());
    }
}
