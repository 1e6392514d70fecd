//! Compute device selection.

use candle_core::Device;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::QualityError;

/// Which kind of device the sharpness pipeline may run on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// Use a GPU when one is available, otherwise the CPU.
    #[default]
    Auto,
    /// Require a GPU.
    Gpu,
    /// Always use the CPU.
    Cpu,
}

impl std::str::FromStr for BackendPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "gpu" => Ok(Self::Gpu),
            "cpu" => Ok(Self::Cpu),
            other => Err(format!("unknown backend '{other}', expected auto, gpu or cpu")),
        }
    }
}

/// Returns the first GPU device this build can open, if any.
///
/// Metal is tried on builds with the `metal` feature, CUDA on builds with
/// the `cuda` feature.
#[must_use]
pub fn gpu_device() -> Option<Device> {
    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            return Some(device);
        }
    }

    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            return Some(device);
        }
    }

    None
}

/// Picks the device for a preference.
///
/// # Errors
///
/// Returns [`QualityError::ComputeBackendUnavailable`] when a GPU is required
/// but none can be opened.
pub fn select_device(preference: BackendPreference) -> Result<Device, QualityError> {
    match preference {
        BackendPreference::Cpu => {
            info!("Using CPU for sharpness analysis");
            Ok(Device::Cpu)
        }
        BackendPreference::Gpu => {
            let device = gpu_device().ok_or_else(|| {
                QualityError::ComputeBackendUnavailable(
                    "no Metal or CUDA device available in this build".into(),
                )
            })?;
            info!("Using {} for sharpness analysis", describe(&device));
            Ok(device)
        }
        BackendPreference::Auto => {
            let device = gpu_device().unwrap_or(Device::Cpu);
            info!("Using {} for sharpness analysis", describe(&device));
            Ok(device)
        }
    }
}

/// Short human-readable device name.
#[must_use]
pub const fn describe(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "CPU",
        Device::Cuda(_) => "CUDA device",
        Device::Metal(_) => "Metal device",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_preference_always_succeeds() {
        let device = select_device(BackendPreference::Cpu);
        assert!(matches!(device, Ok(Device::Cpu)));
    }

    #[test]
    fn test_auto_preference_returns_a_device() {
        assert!(select_device(BackendPreference::Auto).is_ok());
    }

    #[test]
    fn test_gpu_preference_matches_availability() {
        let result = select_device(BackendPreference::Gpu);
        if gpu_device().is_some() {
            assert!(result.is_ok());
        } else {
            assert!(matches!(
                result,
                Err(QualityError::ComputeBackendUnavailable(_))
            ));
        }
    }

    #[test]
    fn test_parse_preference() {
        assert_eq!("gpu".parse(), Ok(BackendPreference::Gpu));
        assert_eq!("cpu".parse(), Ok(BackendPreference::Cpu));
        assert_eq!("auto".parse(), Ok(BackendPreference::Auto));
        assert!("tpu".parse::<BackendPreference>().is_err());
    }
}
