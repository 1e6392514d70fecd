//! Observer port notified as each assessment completes.

use crate::domain::QualityVerdict;

/// Receives the per-axis flags and the final verdict of an assessment.
///
/// For every call that completes, `on_brightness_checked` and
/// `on_blur_checked` fire exactly once each, in that order, followed by
/// `on_verdict`. A skipped check reports `false`. Failed calls notify
/// nothing.
pub trait QualityObserver: Send + Sync {
    /// Reports the underexposure flag.
    fn on_brightness_checked(&self, is_dark: bool);

    /// Reports the blur flag.
    fn on_blur_checked(&self, is_blur: bool);

    /// Reports the combined verdict.
    fn on_verdict(&self, verdict: &QualityVerdict) {
        let _ = verdict;
    }
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl QualityObserver for NullObserver {
    fn on_brightness_checked(&self, _is_dark: bool) {}

    fn on_blur_checked(&self, _is_blur: bool) {}
}
