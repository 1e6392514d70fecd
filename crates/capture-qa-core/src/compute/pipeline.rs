//! The three-stage compute abstraction behind the sharpness analyzer.

use crate::domain::{ImageView, QualityError};

/// A 3x3 convolution kernel in row-major order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel3x3([f32; 9]);

impl Kernel3x3 {
    #[must_use]
    pub const fn new(weights: [f32; 9]) -> Self {
        Self(weights)
    }

    #[must_use]
    pub const fn weights(&self) -> &[f32; 9] {
        &self.0
    }

    /// Weight at `row`, `col`, both in `0..3`.
    #[must_use]
    pub const fn at(&self, row: usize, col: usize) -> f32 {
        self.0[row * 3 + col]
    }
}

/// Four-neighbour Laplacian.
pub const LAPLACIAN: Kernel3x3 = Kernel3x3::new([0.0, 1.0, 0.0, 1.0, -4.0, 1.0, 0.0, 1.0, 0.0]);

/// Mean and population variance of a texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    pub mean: f64,
    pub variance: f64,
}

/// Upload, convolve and reduce, on whatever device the implementation owns.
///
/// Textures hold single-channel BT.601 luma normalized to `[0, 1]`.
/// Convolution replicates edge pixels, so a uniform image filters to zero
/// everywhere.
pub trait ComputePipeline: Send + Sync {
    /// Device-side image representation.
    type Texture;

    /// Short name for logs and reports.
    fn name(&self) -> &'static str;

    /// Copies the image to the device as a luma texture.
    ///
    /// # Errors
    ///
    /// Returns [`QualityError::InvalidImage`] for a malformed view and
    /// [`QualityError::ResourceAllocationFailed`] when the texture cannot be
    /// allocated.
    fn upload(&self, image: &ImageView<'_>) -> Result<Self::Texture, QualityError>;

    /// Applies `kernel` over the full resolution.
    ///
    /// # Errors
    ///
    /// Returns [`QualityError::ResourceAllocationFailed`] when the output
    /// texture cannot be allocated.
    fn convolve(
        &self,
        texture: &Self::Texture,
        kernel: &Kernel3x3,
    ) -> Result<Self::Texture, QualityError>;

    /// Stores a texture as an 8-bit normalized target would: clamped to
    /// `[0, 1]` and rounded to multiples of `1/255`.
    ///
    /// # Errors
    ///
    /// Returns [`QualityError::ResourceAllocationFailed`] when the output
    /// texture cannot be allocated.
    fn quantize_unorm8(&self, texture: &Self::Texture) -> Result<Self::Texture, QualityError>;

    /// Reduces a texture to its mean and variance, blocking until the
    /// device has finished.
    ///
    /// # Errors
    ///
    /// Returns [`QualityError::ResourceAllocationFailed`] when the reduction
    /// buffers cannot be allocated.
    fn reduce_mean_variance(&self, texture: &Self::Texture) -> Result<Statistics, QualityError>;

    /// Runs one ordered stream of stages on the device queue.
    ///
    /// Implementations backed by a shared device serialize streams here.
    fn submit<T>(&self, work: impl FnOnce() -> T) -> T {
        work()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_laplacian_sums_to_zero() {
        let sum: f32 = LAPLACIAN.weights().iter().sum();
        assert!(sum.abs() < f32::EPSILON);
        assert!((LAPLACIAN.at(1, 1) + 4.0).abs() < f32::EPSILON);
        assert!((LAPLACIAN.at(0, 1) - 1.0).abs() < f32::EPSILON);
        assert!(LAPLACIAN.at(0, 0).abs() < f32::EPSILON);
    }
}
