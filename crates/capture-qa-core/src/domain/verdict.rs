//! Scores and verdicts produced by one assessment call.

use serde::{Deserialize, Serialize};

/// Mean BT.601 luma of an image, on the 0-255 scale.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LuminanceScore(f64);

impl LuminanceScore {
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

/// Variance of the Laplacian response, expressed on the 8-bit channel scale.
///
/// Lower means blurrier. In legacy readback mode the value is a whole number
/// in `0..=64`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SharpnessScore(f64);

impl SharpnessScore {
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

/// Accept/reject decision for one capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualityVerdict {
    /// Luminance fell below the dark threshold.
    pub is_dark: bool,
    /// Sharpness fell to or below the blur threshold.
    pub is_blur: bool,
    /// Neither flag is set.
    pub is_acceptable: bool,
}

impl QualityVerdict {
    /// Builds a verdict; acceptability is derived from the two flags.
    #[must_use]
    pub const fn from_flags(is_dark: bool, is_blur: bool) -> Self {
        Self {
            is_dark,
            is_blur,
            is_acceptable: !(is_dark || is_blur),
        }
    }
}

/// A verdict together with the scores that produced it.
///
/// A score is `None` when its check did not run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub verdict: QualityVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub luminance: Option<LuminanceScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharpness: Option<SharpnessScore>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceptable_only_without_flags() {
        assert!(QualityVerdict::from_flags(false, false).is_acceptable);
        assert!(!QualityVerdict::from_flags(true, false).is_acceptable);
        assert!(!QualityVerdict::from_flags(false, true).is_acceptable);
        assert!(!QualityVerdict::from_flags(true, true).is_acceptable);
    }

    #[test]
    fn test_verdict_serializes_snake_case() {
        let json = serde_json::to_string(&QualityVerdict::from_flags(true, false))
            .unwrap_or_default();
        assert_eq!(
            json,
            r#"{"is_dark":true,"is_blur":false,"is_acceptable":false}"#
        );
    }

    #[test]
    fn test_assessment_omits_skipped_scores() {
        let assessment = Assessment {
            verdict: QualityVerdict::from_flags(false, false),
            luminance: Some(LuminanceScore::new(128.0)),
            sharpness: None,
        };
        let json = serde_json::to_string(&assessment).unwrap_or_default();
        assert!(json.contains(r#""luminance":128.0"#), "{json}");
        assert!(!json.contains("sharpness"), "{json}");
    }
}
