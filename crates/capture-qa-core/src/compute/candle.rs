//! Tensor-backed compute pipeline running on Metal, CUDA or the candle CPU
//! device.

use std::sync::{Mutex, PoisonError};

use candle_core::{DType, Device, Tensor};
use once_cell::sync::OnceCell;
use tracing::debug;

use super::device::{describe, select_device, BackendPreference};
use super::pipeline::{ComputePipeline, Kernel3x3, Statistics};
use crate::domain::{ImageView, QualityError};

/// BT.601 weights pre-divided by 255 so the luma texture lands in `[0, 1]`.
const LUMA_WEIGHTS: [f32; 3] = [0.299 / 255.0, 0.587 / 255.0, 0.114 / 255.0];

static SHARED: OnceCell<Result<CandlePipeline, QualityError>> = OnceCell::new();

/// Compute pipeline over candle tensors.
///
/// Textures are `(1, 1, height, width)` f32 tensors resident on the device.
#[derive(Debug)]
pub struct CandlePipeline {
    device: Device,
    queue: Mutex<()>,
}

impl CandlePipeline {
    #[must_use]
    pub const fn new(device: Device) -> Self {
        Self {
            device,
            queue: Mutex::new(()),
        }
    }

    /// The process-wide GPU pipeline.
    ///
    /// Opened on first use and kept for the life of the process. If no GPU
    /// can be opened the failure is remembered and every later call returns
    /// the same [`QualityError::ComputeBackendUnavailable`].
    ///
    /// # Errors
    ///
    /// Returns [`QualityError::ComputeBackendUnavailable`] when this build
    /// has no usable GPU.
    pub fn shared() -> Result<&'static Self, QualityError> {
        SHARED
            .get_or_init(|| {
                debug!("Opening shared GPU compute pipeline");
                select_device(BackendPreference::Gpu).map(Self::new)
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    #[must_use]
    pub const fn device(&self) -> &Device {
        &self.device
    }
}

/// Substrings that mark a device error as an allocation failure.
const ALLOCATION_MARKERS: &[&str] = &[
    "out of memory",
    "out_of_memory",
    "alloc",
    "failed to create metal resource",
];

/// Maps a candle error from `stage` onto the pipeline's error kinds.
///
/// Allocation failures may clear up on a later call; anything else means the
/// device cannot run this pipeline at all.
fn classify(stage: &'static str, err: &candle_core::Error) -> QualityError {
    let message = format!("{stage}: {err}");
    let lower = message.to_lowercase();
    if ALLOCATION_MARKERS.iter().any(|marker| lower.contains(marker)) {
        QualityError::ResourceAllocationFailed(message)
    } else {
        QualityError::ComputeBackendUnavailable(message)
    }
}

fn tensor_error(stage: &'static str) -> impl FnOnce(candle_core::Error) -> QualityError {
    move |err| classify(stage, &err)
}

impl ComputePipeline for CandlePipeline {
    type Texture = Tensor;

    fn name(&self) -> &'static str {
        describe(&self.device)
    }

    fn upload(&self, image: &ImageView<'_>) -> Result<Tensor, QualityError> {
        image.validate()?;
        let width = image.width() as usize;
        let height = image.height() as usize;
        let bpp = image.format().bytes_per_pixel();

        let mut rgb = Vec::new();
        rgb.try_reserve_exact(image.pixel_count() * 3).map_err(|e| {
            QualityError::ResourceAllocationFailed(format!("{width}x{height} staging buffer: {e}"))
        })?;
        for row in image.rows() {
            for px in row.chunks_exact(bpp) {
                rgb.extend_from_slice(&px[..3]);
            }
        }

        let weights =
            Tensor::from_slice(&LUMA_WEIGHTS, 3, &self.device).map_err(tensor_error("upload"))?;
        let texture = Tensor::from_vec(rgb, (height, width, 3), &self.device)
            .and_then(|t| t.to_dtype(DType::F32))
            .and_then(|t| t.broadcast_mul(&weights))
            .and_then(|t| t.sum(2))
            .and_then(|t| t.reshape((1, 1, height, width)))
            .map_err(tensor_error("upload"))?;

        debug!("Uploaded {width}x{height} luma texture to {}", self.name());
        Ok(texture)
    }

    fn convolve(&self, texture: &Tensor, kernel: &Kernel3x3) -> Result<Tensor, QualityError> {
        let weights = Tensor::from_slice(kernel.weights(), (1, 1, 3, 3), &self.device)
            .map_err(tensor_error("convolve"))?;
        texture
            .pad_with_same(2, 1, 1)
            .and_then(|t| t.pad_with_same(3, 1, 1))
            .and_then(|t| t.conv2d(&weights, 0, 1, 1, 1))
            .map_err(tensor_error("convolve"))
    }

    fn quantize_unorm8(&self, texture: &Tensor) -> Result<Tensor, QualityError> {
        texture
            .clamp(0f32, 1f32)
            .and_then(|t| t.affine(255.0, 0.0))
            .and_then(|t| t.round())
            .and_then(|t| t.affine(1.0 / 255.0, 0.0))
            .map_err(tensor_error("quantize"))
    }

    #[allow(clippy::cast_precision_loss)]
    fn reduce_mean_variance(&self, texture: &Tensor) -> Result<Statistics, QualityError> {
        let (_, _, height, width) = texture.dims4().map_err(tensor_error("reduce"))?;
        if height * width == 0 {
            return Err(QualityError::invalid("cannot reduce an empty texture"));
        }

        // Row sums of x and x^2 are taken on the device in f32 and read back
        // together; the totals are accumulated on the host in f64.
        let rows = texture
            .reshape((height, width))
            .and_then(|t| Tensor::stack(&[t.sum(1)?, t.sqr()?.sum(1)?], 0))
            .and_then(|t| t.to_vec2::<f32>())
            .map_err(tensor_error("readback"))?;
        let [sums, squares] = rows.as_slice() else {
            return Err(QualityError::ComputeBackendUnavailable(format!(
                "readback returned {} rows",
                rows.len()
            )));
        };

        let n = (height * width) as f64;
        let mean = sums.iter().copied().map(f64::from).sum::<f64>() / n;
        let mean_square = squares.iter().copied().map(f64::from).sum::<f64>() / n;
        Ok(Statistics {
            mean,
            variance: (mean_square - mean * mean).max(0.0),
        })
    }

    fn submit<T>(&self, work: impl FnOnce() -> T) -> T {
        let _queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        work()
    }
}
