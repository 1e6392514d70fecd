//! Core domain types for capture quality assessment.

mod cancel;
mod error;
mod features;
mod result;
mod verdict;
mod view;

pub use cancel::CancelToken;
pub use error::{ImageLoadError, QualityError};
pub use features::{FeatureConfig, FeatureToggles};
pub use result::{AnalysisResult, ImageDimensions, ImageInfo};
pub use verdict::{Assessment, LuminanceScore, QualityVerdict, SharpnessScore};
pub use view::{luma_bt601, ImageView, PixelFormat};
