//! Compute backends for the sharpness analyzer.
//!
//! [`CandlePipeline`] runs on a GPU through candle; [`CpuPipeline`] is the
//! rayon fallback. [`Backend`] picks between them at runtime.

mod candle;
mod cpu;
mod device;
mod pipeline;

pub use self::candle::CandlePipeline;
pub use cpu::{CpuPipeline, LumaPlane};
pub use device::{describe, gpu_device, select_device, BackendPreference};
pub use pipeline::{ComputePipeline, Kernel3x3, Statistics, LAPLACIAN};

use candle_core::Tensor;
use tracing::{debug, info};

use crate::domain::{ImageView, QualityError};

/// A runtime-selected pipeline.
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    /// The process-wide GPU pipeline.
    Gpu(&'static CandlePipeline),
    /// The CPU fallback.
    Cpu(CpuPipeline),
}

/// Texture of whichever pipeline produced it.
#[derive(Debug)]
pub enum BackendTexture {
    Gpu(Tensor),
    Cpu(LumaPlane),
}

impl Backend {
    /// Resolves a preference into a pipeline.
    ///
    /// `Auto` falls back to the CPU when no GPU can be opened.
    ///
    /// # Errors
    ///
    /// Returns [`QualityError::ComputeBackendUnavailable`] for
    /// [`BackendPreference::Gpu`] when no GPU is available.
    pub fn select(preference: BackendPreference) -> Result<Self, QualityError> {
        match preference {
            BackendPreference::Cpu => Ok(Self::Cpu(CpuPipeline::new())),
            BackendPreference::Gpu => CandlePipeline::shared().map(Self::Gpu),
            BackendPreference::Auto => match CandlePipeline::shared() {
                Ok(pipeline) => Ok(Self::Gpu(pipeline)),
                Err(err) => {
                    debug!("{err}");
                    info!("No GPU available, using CPU for sharpness analysis");
                    Ok(Self::Cpu(CpuPipeline::new()))
                }
            },
        }
    }
}

fn mismatched() -> QualityError {
    QualityError::ComputeBackendUnavailable("texture belongs to another backend".into())
}

impl ComputePipeline for Backend {
    type Texture = BackendTexture;

    fn name(&self) -> &'static str {
        match self {
            Self::Gpu(p) => p.name(),
            Self::Cpu(p) => p.name(),
        }
    }

    fn upload(&self, image: &ImageView<'_>) -> Result<BackendTexture, QualityError> {
        match self {
            Self::Gpu(p) => p.upload(image).map(BackendTexture::Gpu),
            Self::Cpu(p) => p.upload(image).map(BackendTexture::Cpu),
        }
    }

    fn convolve(
        &self,
        texture: &BackendTexture,
        kernel: &Kernel3x3,
    ) -> Result<BackendTexture, QualityError> {
        match (self, texture) {
            (Self::Gpu(p), BackendTexture::Gpu(t)) => p.convolve(t, kernel).map(BackendTexture::Gpu),
            (Self::Cpu(p), BackendTexture::Cpu(t)) => p.convolve(t, kernel).map(BackendTexture::Cpu),
            _ => Err(mismatched()),
        }
    }

    fn quantize_unorm8(&self, texture: &BackendTexture) -> Result<BackendTexture, QualityError> {
        match (self, texture) {
            (Self::Gpu(p), BackendTexture::Gpu(t)) => p.quantize_unorm8(t).map(BackendTexture::Gpu),
            (Self::Cpu(p), BackendTexture::Cpu(t)) => p.quantize_unorm8(t).map(BackendTexture::Cpu),
            _ => Err(mismatched()),
        }
    }

    fn reduce_mean_variance(&self, texture: &BackendTexture) -> Result<Statistics, QualityError> {
        match (self, texture) {
            (Self::Gpu(p), BackendTexture::Gpu(t)) => p.reduce_mean_variance(t),
            (Self::Cpu(p), BackendTexture::Cpu(t)) => p.reduce_mean_variance(t),
            _ => Err(mismatched()),
        }
    }

    fn submit<T>(&self, work: impl FnOnce() -> T) -> T {
        match self {
            Self::Gpu(p) => p.submit(work),
            Self::Cpu(p) => p.submit(work),
        }
    }
}
