//! Quality decision: combines both analyzers into one verdict.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use super::luminance::{LuminanceAnalyzer, LuminanceConfig};
use super::sharpness::{SharpnessAnalyzer, SharpnessConfig};
use crate::compute::ComputePipeline;
use crate::domain::{
    Assessment, CancelToken, FeatureConfig, ImageView, QualityError, QualityVerdict,
    SharpnessScore,
};
use crate::ports::QualityObserver;

/// The entry point callers use to score a capture.
///
/// Brightness and blur are mutually exclusive: the sharpness analyzer only
/// runs while the brightness check is disabled. Once the compute backend
/// has been reported unavailable, blur checking stays off for the life of
/// the assessor and every later verdict reports `is_blur = false`.
#[derive(Debug)]
pub struct QualityAssessor<P> {
    luminance: LuminanceAnalyzer,
    sharpness: SharpnessAnalyzer<P>,
    blur_backend_lost: AtomicBool,
}

impl<P: ComputePipeline> QualityAssessor<P> {
    #[must_use]
    pub const fn new(pipeline: P, luminance: LuminanceConfig, sharpness: SharpnessConfig) -> Self {
        Self {
            luminance: LuminanceAnalyzer::new(luminance),
            sharpness: SharpnessAnalyzer::new(pipeline, sharpness),
            blur_backend_lost: AtomicBool::new(false),
        }
    }

    /// An assessor with the default thresholds.
    #[must_use]
    pub fn with_defaults(pipeline: P) -> Self {
        Self::new(
            pipeline,
            LuminanceConfig::default(),
            SharpnessConfig::default(),
        )
    }

    #[must_use]
    pub const fn luminance(&self) -> &LuminanceAnalyzer {
        &self.luminance
    }

    #[must_use]
    pub const fn sharpness(&self) -> &SharpnessAnalyzer<P> {
        &self.sharpness
    }

    /// True once the sharpness backend has been reported unavailable.
    #[must_use]
    pub fn is_blur_backend_lost(&self) -> bool {
        self.blur_backend_lost.load(Ordering::Acquire)
    }

    /// Scores `image` under `features` and notifies `observer`.
    ///
    /// # Errors
    ///
    /// Returns [`QualityError::InvalidImage`] for a malformed view, even when
    /// both checks are disabled, and [`QualityError::ResourceAllocationFailed`]
    /// when the sharpness pipeline runs out of device memory.
    pub fn assess(
        &self,
        image: &ImageView<'_>,
        features: FeatureConfig,
        observer: &dyn QualityObserver,
    ) -> Result<QualityVerdict, QualityError> {
        self.assess_detailed(image, features, observer)
            .map(|assessment| assessment.verdict)
    }

    /// Like [`assess`](Self::assess), also returning the scores.
    ///
    /// # Errors
    ///
    /// See [`assess`](Self::assess).
    pub fn assess_detailed(
        &self,
        image: &ImageView<'_>,
        features: FeatureConfig,
        observer: &dyn QualityObserver,
    ) -> Result<Assessment, QualityError> {
        self.assess_with_cancel(image, features, observer, &CancelToken::new())
    }

    /// Like [`assess_detailed`](Self::assess_detailed), abandoning the call
    /// with [`QualityError::Cancelled`] once `cancel` is raised.
    ///
    /// A cancelled call produces no verdict and notifies nothing.
    ///
    /// # Errors
    ///
    /// See [`assess`](Self::assess), plus [`QualityError::Cancelled`].
    pub fn assess_with_cancel(
        &self,
        image: &ImageView<'_>,
        features: FeatureConfig,
        observer: &dyn QualityObserver,
        cancel: &CancelToken,
    ) -> Result<Assessment, QualityError> {
        image.validate()?;
        cancel.check()?;

        let luminance = if features.brightness_check_enabled {
            Some(self.luminance.compute(image)?)
        } else {
            None
        };
        let is_dark = luminance.is_some_and(|score| self.luminance.is_dark(score));

        let sharpness = if features.runs_blur_check() && !self.is_blur_backend_lost() {
            self.evaluate_sharpness(image, cancel)?
        } else {
            None
        };
        let is_blur = sharpness.is_some_and(|score| self.sharpness.is_blur(score));

        cancel.check()?;
        let verdict = QualityVerdict::from_flags(is_dark, is_blur);
        debug!(
            "Assessed {}x{}: dark={is_dark} blur={is_blur} acceptable={}",
            image.width(),
            image.height(),
            verdict.is_acceptable
        );

        observer.on_brightness_checked(is_dark);
        observer.on_blur_checked(is_blur);
        observer.on_verdict(&verdict);

        Ok(Assessment {
            verdict,
            luminance,
            sharpness,
        })
    }

    /// Runs the sharpness analyzer, turning a lost backend into a skipped check.
    fn evaluate_sharpness(
        &self,
        image: &ImageView<'_>,
        cancel: &CancelToken,
    ) -> Result<Option<SharpnessScore>, QualityError> {
        match self.sharpness.compute_blur_variance_with_cancel(image, cancel) {
            Ok(score) => Ok(Some(score)),
            Err(QualityError::ComputeBackendUnavailable(reason)) => {
                if !self.blur_backend_lost.swap(true, Ordering::AcqRel) {
                    warn!("Blur check disabled: compute backend unavailable: {reason}");
                }
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
