//! Rayon-parallel CPU implementation of the compute pipeline.

use rayon::prelude::*;
use tracing::debug;

use super::pipeline::{ComputePipeline, Kernel3x3, Statistics};
use crate::domain::{luma_bt601, ImageView, QualityError};

/// Single-channel luma plane in host memory.
#[derive(Debug, Clone)]
pub struct LumaPlane {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl LumaPlane {
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    fn zeroed(width: usize, height: usize) -> Result<Self, QualityError> {
        let len = width.checked_mul(height).ok_or_else(|| {
            QualityError::ResourceAllocationFailed(format!("{width}x{height} plane overflows"))
        })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|e| {
            QualityError::ResourceAllocationFailed(format!("{width}x{height} luma plane: {e}"))
        })?;
        data.resize(len, 0.0);
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Sample with coordinates clamped into the plane.
    #[inline]
    fn clamped(&self, x: isize, y: isize) -> f32 {
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
        let (x, y) = (
            x.clamp(0, self.width as isize - 1) as usize,
            y.clamp(0, self.height as isize - 1) as usize,
        );
        self.data[y * self.width + x]
    }
}

/// CPU fallback used when no GPU device is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuPipeline;

impl CpuPipeline {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ComputePipeline for CpuPipeline {
    type Texture = LumaPlane;

    fn name(&self) -> &'static str {
        "cpu"
    }

    fn upload(&self, image: &ImageView<'_>) -> Result<LumaPlane, QualityError> {
        image.validate()?;
        let width = image.width() as usize;
        let mut plane = LumaPlane::zeroed(width, image.height() as usize)?;

        let bpp = image.format().bytes_per_pixel();
        let row_bytes = image.row_bytes();
        plane
            .data
            .par_chunks_mut(width)
            .zip(image.covered_bytes().par_chunks_exact(image.stride()))
            .for_each(|(out, row)| {
                for (dst, px) in out.iter_mut().zip(row[..row_bytes].chunks_exact(bpp)) {
                    #[allow(clippy::cast_possible_truncation)]
                    {
                        *dst = (luma_bt601(px) / 255.0) as f32;
                    }
                }
            });

        debug!("Uploaded {}x{} luma plane", plane.width, plane.height);
        Ok(plane)
    }

    fn convolve(&self, texture: &LumaPlane, kernel: &Kernel3x3) -> Result<LumaPlane, QualityError> {
        let mut out = LumaPlane::zeroed(texture.width, texture.height)?;
        let width = texture.width;

        out.data
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                #[allow(clippy::cast_possible_wrap)]
                let y = y as isize;
                for (x, dst) in row.iter_mut().enumerate() {
                    #[allow(clippy::cast_possible_wrap)]
                    let x = x as isize;
                    let mut acc = 0.0f32;
                    for ky in 0..3 {
                        for kx in 0..3 {
                            let weight = kernel.at(ky, kx);
                            if weight != 0.0 {
                                #[allow(clippy::cast_possible_wrap)]
                                let (dx, dy) = (kx as isize - 1, ky as isize - 1);
                                acc += weight * texture.clamped(x + dx, y + dy);
                            }
                        }
                    }
                    *dst = acc;
                }
            });

        Ok(out)
    }

    fn quantize_unorm8(&self, texture: &LumaPlane) -> Result<LumaPlane, QualityError> {
        let mut out = LumaPlane::zeroed(texture.width, texture.height)?;
        out.data
            .par_iter_mut()
            .zip(texture.data.par_iter())
            .for_each(|(dst, &v)| *dst = (v.clamp(0.0, 1.0) * 255.0).round() / 255.0);
        Ok(out)
    }

    #[allow(clippy::cast_precision_loss)]
    fn reduce_mean_variance(&self, texture: &LumaPlane) -> Result<Statistics, QualityError> {
        if texture.data.is_empty() {
            return Err(QualityError::invalid("cannot reduce an empty texture"));
        }
        let n = texture.data.len() as f64;

        let mean = ordered_row_sum(texture, |v| v) / n;
        let variance = ordered_row_sum(texture, |v| {
            let d = v - mean;
            d * d
        }) / n;

        Ok(Statistics { mean, variance })
    }
}

/// Sums `f` over the plane: rows in parallel, then the row totals in order.
fn ordered_row_sum(texture: &LumaPlane, f: impl Fn(f64) -> f64 + Sync) -> f64 {
    let rows: Vec<f64> = texture
        .data
        .par_chunks(texture.width)
        .map(|row| row.iter().map(|&v| f(f64::from(v))).sum::<f64>())
        .collect();
    rows.iter().sum()
}
