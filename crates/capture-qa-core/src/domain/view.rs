//! Borrowed pixel buffer views.

use super::QualityError;

/// Interleaved 8-bit pixel layouts the pipeline accepts.
///
/// Every layout starts with red, green and blue in that order; any trailing
/// channel is ignored.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Three bytes per pixel: R, G, B.
    Rgb8,
    /// Four bytes per pixel: R, G, B, A.
    Rgba8,
    /// Four bytes per pixel: R, G, B and one padding byte.
    Rgbx8,
}

impl PixelFormat {
    /// Bytes occupied by one pixel.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 | Self::Rgbx8 => 4,
        }
    }
}

/// Immutable view over a caller-owned pixel buffer.
///
/// Rows start every `stride` bytes, which may exceed
/// `width * bytes_per_pixel` when the producer pads rows. The view is only
/// borrowed for one analysis call.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
}

impl<'a> ImageView<'a> {
    /// Wraps a raw buffer. Nothing is checked until [`validate`](Self::validate).
    #[must_use]
    pub const fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
    ) -> Self {
        Self {
            data,
            width,
            height,
            stride,
            format,
        }
    }

    /// Wraps a tightly packed buffer (no row padding).
    #[must_use]
    pub const fn packed(data: &'a [u8], width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = width as usize * format.bytes_per_pixel();
        Self::new(data, width, height, stride, format)
    }

    /// Views an `image` crate RGB buffer.
    #[must_use]
    pub fn from_rgb8(image: &'a image::RgbImage) -> Self {
        Self::packed(image.as_raw(), image.width(), image.height(), PixelFormat::Rgb8)
    }

    /// Views an `image` crate RGBA buffer.
    #[must_use]
    pub fn from_rgba8(image: &'a image::RgbaImage) -> Self {
        Self::packed(image.as_raw(), image.width(), image.height(), PixelFormat::Rgba8)
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    #[must_use]
    pub const fn format(&self) -> PixelFormat {
        self.format
    }

    /// Number of pixels, `width * height`.
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Checks the view invariants.
    ///
    /// # Errors
    ///
    /// Returns [`QualityError::InvalidImage`] if either dimension is zero, if
    /// a row does not fit in `stride`, or if the buffer is shorter than
    /// `stride * height`.
    pub fn validate(&self) -> Result<(), QualityError> {
        if self.width == 0 || self.height == 0 {
            return Err(QualityError::invalid(format!(
                "dimensions must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }

        let row_bytes = (self.width as usize)
            .checked_mul(self.format.bytes_per_pixel())
            .ok_or_else(|| QualityError::invalid("row size overflows usize"))?;
        if self.stride < row_bytes {
            return Err(QualityError::invalid(format!(
                "stride {} is smaller than row size {row_bytes}",
                self.stride
            )));
        }

        let required = self
            .stride
            .checked_mul(self.height as usize)
            .ok_or_else(|| QualityError::invalid("stride * height overflows usize"))?;
        if self.data.len() < required {
            return Err(QualityError::invalid(format!(
                "buffer holds {} bytes, need at least {required}",
                self.data.len()
            )));
        }

        Ok(())
    }

    /// Iterates rows, each trimmed to the `width` pixels it holds.
    ///
    /// Yields nothing for a view that fails [`validate`](Self::validate).
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        let row_bytes = self.row_bytes();
        self.covered_bytes()
            .chunks_exact(self.stride.max(1))
            .map(move |row| &row[..row_bytes])
    }

    /// The bytes covered by the view, `stride * height` long.
    ///
    /// Empty for a view that fails [`validate`](Self::validate).
    #[must_use]
    pub fn covered_bytes(&self) -> &'a [u8] {
        if self.validate().is_err() {
            return &[];
        }
        let data: &'a [u8] = self.data;
        &data[..self.stride * self.height as usize]
    }

    /// Bytes of pixel data in one row, excluding padding.
    #[must_use]
    pub const fn row_bytes(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }
}

/// ITU-R BT.601 luma of one pixel, on the 0-255 scale.
#[inline]
#[must_use]
#[allow(clippy::suboptimal_flops)]
pub fn luma_bt601(pixel: &[u8]) -> f64 {
    0.299 * f64::from(pixel[0]) + 0.587 * f64::from(pixel[1]) + 0.114 * f64::from(pixel[2])
}
