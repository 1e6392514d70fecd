//! Luminance analysis.
//!
//! Scores a capture by its mean BT.601 luma and flags it as dark below a
//! threshold.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{luma_bt601, ImageView, LuminanceScore, QualityError};

/// Configuration for the darkness check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LuminanceConfig {
    /// Mean luma (0-255) strictly below which an image is dark.
    pub dark_threshold: f64,
}

impl Default for LuminanceConfig {
    fn default() -> Self {
        Self {
            dark_threshold: 40.0,
        }
    }
}

/// Mean luma over every pixel of the image.
///
/// Rows are summed in parallel in `f64` and combined in row order. The
/// result is neither rounded nor clamped.
///
/// # Errors
///
/// Returns [`QualityError::InvalidImage`] if the view is malformed.
#[allow(clippy::cast_precision_loss)]
pub fn compute_luminance(image: &ImageView<'_>) -> Result<LuminanceScore, QualityError> {
    image.validate()?;

    let bpp = image.format().bytes_per_pixel();
    let row_bytes = image.row_bytes();
    let row_sums: Vec<f64> = image
        .covered_bytes()
        .par_chunks_exact(image.stride())
        .map(|row| row[..row_bytes].chunks_exact(bpp).map(luma_bt601).sum::<f64>())
        .collect();
    // Rows are combined in order so the score does not depend on scheduling.
    let sum: f64 = row_sums.iter().sum();

    Ok(LuminanceScore::new(sum / image.pixel_count() as f64))
}

/// Computes luminance and applies the dark threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuminanceAnalyzer {
    config: LuminanceConfig,
}

impl LuminanceAnalyzer {
    #[must_use]
    pub const fn new(config: LuminanceConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &LuminanceConfig {
        &self.config
    }

    /// See [`compute_luminance`].
    ///
    /// # Errors
    ///
    /// Returns [`QualityError::InvalidImage`] if the view is malformed.
    pub fn compute(&self, image: &ImageView<'_>) -> Result<LuminanceScore, QualityError> {
        compute_luminance(image)
    }

    /// True when the score is strictly below the dark threshold.
    #[must_use]
    pub fn is_dark(&self, score: LuminanceScore) -> bool {
        score.value() < self.config.dark_threshold
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::PixelFormat;

    fn uniform(value: u8, width: u32, height: u32) -> Vec<u8> {
        vec![value; width as usize * height as usize * 3]
    }

    #[test]
    fn test_uniform_image_scores_its_value() {
        for (value, width, height) in [(0u8, 1, 1), (17, 5, 3), (128, 64, 48), (255, 100, 100)] {
            let data = uniform(value, width, height);
            let view = ImageView::packed(&data, width, height, PixelFormat::Rgb8);
            let score = compute_luminance(&view).unwrap();
            assert!(
                (score.value() - f64::from(value)).abs() < 1e-9,
                "{value} at {width}x{height} gave {}",
                score.value()
            );
        }
    }

    #[test]
    fn test_channel_weights() {
        let data = [255u8, 0, 0, 0, 255, 0];
        let view = ImageView::packed(&data, 2, 1, PixelFormat::Rgb8);
        let score = compute_luminance(&view).unwrap();
        assert!((score.value() - (76.245 + 149.685) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_alpha_and_padding_are_ignored() {
        // 1x2 RGBA, alpha 0, 4 bytes of row padding filled with white
        let data = [
            10u8, 10, 10, 0, 255, 255, 255, 255, //
            30, 30, 30, 0, 255, 255, 255, 255,
        ];
        let view = ImageView::new(&data, 1, 2, 8, PixelFormat::Rgba8);
        let score = compute_luminance(&view).unwrap();
        assert!((score.value() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_image() {
        let view = ImageView::new(&[], 0, 4, 0, PixelFormat::Rgb8);
        assert!(matches!(
            compute_luminance(&view),
            Err(QualityError::InvalidImage(_))
        ));

        let data = [0u8; 5];
        let view = ImageView::packed(&data, 2, 1, PixelFormat::Rgb8);
        assert!(matches!(
            compute_luminance(&view),
            Err(QualityError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_dark_threshold_is_strict() {
        let analyzer = LuminanceAnalyzer::default();
        assert!(!analyzer.is_dark(LuminanceScore::new(40.0)));
        assert!(analyzer.is_dark(LuminanceScore::new(39.999)));
        assert!(!analyzer.is_dark(LuminanceScore::new(255.0)));
        assert!(analyzer.is_dark(LuminanceScore::new(0.0)));
    }

    #[test]
    fn test_custom_threshold() {
        let analyzer = LuminanceAnalyzer::new(LuminanceConfig {
            dark_threshold: 100.0,
        });
        assert!(analyzer.is_dark(LuminanceScore::new(99.0)));
        assert!(!analyzer.is_dark(LuminanceScore::new(100.0)));
    }
}
