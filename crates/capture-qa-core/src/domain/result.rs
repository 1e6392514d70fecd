//! Batch analysis records and loaded images.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::{ImageView, LuminanceScore, PixelFormat, QualityVerdict, SharpnessScore};

/// Assessment record for a single image in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Path to the analyzed image.
    pub path: String,
    /// Timestamp of analysis (ISO 8601).
    pub timestamp: String,
    /// Image dimensions, absent when the file could not be decoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<ImageDimensions>,
    /// Verdict, absent when the image could not be scored.
    pub verdict: Option<QualityVerdict>,
    /// Mean luminance, when the brightness check ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub luminance: Option<LuminanceScore>,
    /// Laplacian variance, when the blur check ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharpness: Option<SharpnessScore>,
    /// Why the image is unscored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// True when the image was scored and rejected.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.verdict.is_some_and(|v| !v.is_acceptable)
    }

    /// True when the image could not be scored.
    #[must_use]
    pub const fn is_unscored(&self) -> bool {
        self.verdict.is_none()
    }
}

/// Image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageDimensions {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A decoded image together with where it came from.
///
/// Pixel data is normalized to RGB8 or RGBA8 on construction so it can
/// always be viewed without copying.
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Path or synthetic identifier of the image.
    pub path: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    image: DynamicImage,
}

impl ImageInfo {
    /// Wraps a decoded image, converting exotic layouts to 8-bit RGB(A).
    #[must_use]
    pub fn new(path: impl Into<String>, image: DynamicImage) -> Self {
        let image = match image {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image,
            other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        };
        Self {
            path: path.into(),
            width: image.width(),
            height: image.height(),
            image,
        }
    }

    /// The normalized decoded image.
    #[must_use]
    pub const fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Borrows the pixels as an analysis view.
    #[must_use]
    pub fn view(&self) -> ImageView<'_> {
        match &self.image {
            DynamicImage::ImageRgb8(buf) => ImageView::from_rgb8(buf),
            DynamicImage::ImageRgba8(buf) => ImageView::from_rgba8(buf),
            // Unreachable through `new`; an empty view fails validation.
            _ => ImageView::new(&[], 0, 0, 0, PixelFormat::Rgb8),
        }
    }

    #[must_use]
    pub const fn dimensions(&self) -> ImageDimensions {
        ImageDimensions::new(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luma_is_expanded_to_rgb() {
        let gray = image::GrayImage::from_pixel(4, 3, image::Luma([77]));
        let info = ImageInfo::new("gray.png", DynamicImage::ImageLuma8(gray));

        let view = info.view();
        assert_eq!(view.format(), PixelFormat::Rgb8);
        assert_eq!(info.dimensions(), ImageDimensions::new(4, 3));
        assert!(view.validate().is_ok());
        assert!(view.rows().all(|row| row.iter().all(|&b| b == 77)));
    }

    #[test]
    fn test_rgba_is_kept() {
        let rgba = image::RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 4]));
        let info = ImageInfo::new("rgba.png", DynamicImage::ImageRgba8(rgba));
        assert_eq!(info.view().format(), PixelFormat::Rgba8);
    }

    #[test]
    fn test_rejected_and_unscored() {
        let mut result = AnalysisResult {
            path: "a.png".into(),
            timestamp: "2024-01-01T00:00:00Z".into(),
            dimensions: Some(ImageDimensions::new(1, 1)),
            verdict: Some(QualityVerdict::from_flags(true, false)),
            luminance: Some(LuminanceScore::new(3.0)),
            sharpness: None,
            error: None,
        };
        assert!(result.is_rejected());
        assert!(!result.is_unscored());

        result.verdict = None;
        result.error = Some("compute backend unavailable".into());
        assert!(!result.is_rejected());
        assert!(result.is_unscored());
    }
}
