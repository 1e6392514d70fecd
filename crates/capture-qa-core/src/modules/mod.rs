//! The two analyzers and the decision that combines them.

mod decision;
mod luminance;
mod sharpness;

pub use decision::QualityAssessor;
pub use luminance::{compute_luminance, LuminanceAnalyzer, LuminanceConfig};
pub use sharpness::{ReadbackMode, SharpnessAnalyzer, SharpnessConfig};
