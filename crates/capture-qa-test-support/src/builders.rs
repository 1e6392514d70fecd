//! Synthetic image builders for testing.

use capture_qa_core::domain::{ImageInfo, ImageView, PixelFormat};
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use imageproc::filter::gaussian_blur_f32;

/// Builder for creating synthetic test images.
///
/// Provides convenience methods for generating captures with specific
/// characteristics (sharp, blurred, dark, bright).
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    // === Sharp Images ===

    /// Creates a 1-pixel black and white checkerboard, the sharpest possible
    /// pattern.
    #[must_use]
    pub fn checkerboard(width: u32, height: u32) -> ImageInfo {
        Self::checkerboard_with_cell_size(width, height, 1)
    }

    /// Creates a checkerboard with custom cell size.
    #[must_use]
    pub fn checkerboard_with_cell_size(width: u32, height: u32, cell_size: u32) -> ImageInfo {
        ImageInfo::new(
            "synthetic://checkerboard",
            DynamicImage::ImageLuma8(checker_luma(width, height, cell_size)),
        )
    }

    /// Creates vertical bars (sharp edges along one axis only).
    #[must_use]
    pub fn vertical_bars(width: u32, height: u32, bar_width: u32) -> ImageInfo {
        let img = GrayImage::from_fn(width, height, |x, _| {
            if (x / bar_width.max(1)) % 2 == 0 {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });
        ImageInfo::new("synthetic://vertical_bars", DynamicImage::ImageLuma8(img))
    }

    // === Blurred Images ===

    /// Creates a checkerboard smoothed with a Gaussian of the given sigma.
    #[must_use]
    pub fn blurred_checkerboard(width: u32, height: u32, cell_size: u32, sigma: f32) -> ImageInfo {
        let blurred = gaussian_blur_f32(&checker_luma(width, height, cell_size), sigma);
        ImageInfo::new(
            "synthetic://blurred_checkerboard",
            DynamicImage::ImageLuma8(blurred),
        )
    }

    /// Creates a uniform gray image (no edges at all).
    #[must_use]
    pub fn uniform_gray(width: u32, height: u32, value: u8) -> ImageInfo {
        Self::uniform_rgb(width, height, value, value, value)
    }

    /// Creates a smooth horizontal gradient.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn horizontal_gradient(width: u32, height: u32) -> ImageInfo {
        let img = GrayImage::from_fn(width, height, |x, _| {
            let val = ((u32::from(u8::MAX) * x) / width.max(1)) as u8;
            Luma([val])
        });
        ImageInfo::new(
            "synthetic://horizontal_gradient",
            DynamicImage::ImageLuma8(img),
        )
    }

    // === Brightness Images ===

    /// Creates an all-black image.
    #[must_use]
    pub fn black(width: u32, height: u32) -> ImageInfo {
        Self::uniform_gray(width, height, 0)
    }

    /// Creates an all-white image.
    #[must_use]
    pub fn white(width: u32, height: u32) -> ImageInfo {
        Self::uniform_gray(width, height, 255)
    }

    /// Creates a uniform RGB color image.
    #[must_use]
    pub fn uniform_rgb(width: u32, height: u32, r: u8, g: u8, b: u8) -> ImageInfo {
        let img = RgbImage::from_pixel(width, height, image::Rgb([r, g, b]));
        ImageInfo::new("synthetic://uniform_rgb", DynamicImage::ImageRgb8(img))
    }
}

fn checker_luma(width: u32, height: u32, cell_size: u32) -> GrayImage {
    let cell = cell_size.max(1);
    GrayImage::from_fn(width, height, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// An owned frame laid out the way camera buffers often are: four bytes per
/// pixel and padded rows.
#[derive(Debug, Clone)]
pub struct PaddedFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
}

impl PaddedFrame {
    /// Re-lays `image` as RGBX with `padding` extra bytes per row.
    ///
    /// Padding and X bytes are filled with `0xFF`, so any code that reads
    /// them skews luminance upwards.
    #[must_use]
    pub fn from_image(image: &ImageInfo, padding: usize) -> Self {
        let rgb = image.image().to_rgb8();
        let stride = image.width as usize * 4 + padding;
        let mut data = vec![0xFF; stride * image.height as usize];
        for (y, row) in rgb.rows().enumerate() {
            for (x, px) in row.enumerate() {
                let offset = y * stride + x * 4;
                data[offset..offset + 3].copy_from_slice(&px.0);
            }
        }
        Self {
            data,
            width: image.width,
            height: image.height,
            stride,
        }
    }

    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Borrows the frame as an analysis view.
    #[must_use]
    pub fn view(&self) -> ImageView<'_> {
        ImageView::new(
            &self.data,
            self.width,
            self.height,
            self.stride,
            PixelFormat::Rgbx8,
        )
    }
}
