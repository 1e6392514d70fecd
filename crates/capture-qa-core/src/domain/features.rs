//! Feature switches for the two quality checks.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Which checks an assessment call runs.
///
/// Passed by value into every call; the caller decides how fresh it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Run the luminance (underexposure) check.
    pub brightness_check_enabled: bool,
    /// Run the sharpness (blur) check. Only honored while the brightness
    /// check is off.
    pub blur_check_enabled: bool,
}

impl FeatureConfig {
    #[must_use]
    pub const fn new(brightness_check_enabled: bool, blur_check_enabled: bool) -> Self {
        Self {
            brightness_check_enabled,
            blur_check_enabled,
        }
    }

    /// True when the sharpness analyzer will actually run.
    #[must_use]
    pub const fn runs_blur_check(&self) -> bool {
        self.blur_check_enabled && !self.brightness_check_enabled
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self::new(true, true)
    }
}

/// Toggles shared with a UI layer that may flip them at any time.
///
/// Each assessment reads them once through [`snapshot`](Self::snapshot); a
/// flip racing with a call may or may not be seen by that call.
#[derive(Debug)]
pub struct FeatureToggles {
    brightness: AtomicBool,
    blur: AtomicBool,
}

impl FeatureToggles {
    #[must_use]
    pub const fn new(config: FeatureConfig) -> Self {
        Self {
            brightness: AtomicBool::new(config.brightness_check_enabled),
            blur: AtomicBool::new(config.blur_check_enabled),
        }
    }

    pub fn set_brightness_check(&self, enabled: bool) {
        self.brightness.store(enabled, Ordering::Relaxed);
    }

    pub fn set_blur_check(&self, enabled: bool) {
        self.blur.store(enabled, Ordering::Relaxed);
    }

    /// Flips the brightness switch and returns the new value.
    pub fn toggle_brightness_check(&self) -> bool {
        !self.brightness.fetch_xor(true, Ordering::Relaxed)
    }

    /// Flips the blur switch and returns the new value.
    pub fn toggle_blur_check(&self) -> bool {
        !self.blur.fetch_xor(true, Ordering::Relaxed)
    }

    /// Reads both switches.
    #[must_use]
    pub fn snapshot(&self) -> FeatureConfig {
        FeatureConfig::new(
            self.brightness.load(Ordering::Relaxed),
            self.blur.load(Ordering::Relaxed),
        )
    }
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_enables_both() {
        let config = FeatureConfig::default();
        assert!(config.brightness_check_enabled);
        assert!(config.blur_check_enabled);
    }

    #[test]
    fn test_blur_runs_only_without_brightness() {
        assert!(!FeatureConfig::new(true, true).runs_blur_check());
        assert!(FeatureConfig::new(false, true).runs_blur_check());
        assert!(!FeatureConfig::new(false, false).runs_blur_check());
        assert!(!FeatureConfig::new(true, false).runs_blur_check());
    }

    #[test]
    fn test_toggles_snapshot() {
        let toggles = FeatureToggles::default();
        toggles.set_brightness_check(false);
        assert_eq!(toggles.snapshot(), FeatureConfig::new(false, true));

        assert!(!toggles.toggle_blur_check());
        assert!(toggles.toggle_brightness_check());
        assert_eq!(toggles.snapshot(), FeatureConfig::new(true, false));
    }
}
