//! Error taxonomy for the quality pipeline.

use thiserror::Error;

/// Errors a single assessment call can fail with.
///
/// The pipeline never retries internally; callers decide whether to
/// re-request the capture.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QualityError {
    /// Malformed or empty input. A caller bug, retrying will not help.
    #[error("invalid image: {0}")]
    InvalidImage(String),
    /// No usable compute device. Permanent for the process lifetime.
    #[error("compute backend unavailable: {0}")]
    ComputeBackendUnavailable(String),
    /// Texture or buffer allocation failed for the requested dimensions.
    #[error("resource allocation failed: {0}")]
    ResourceAllocationFailed(String),
    /// The caller abandoned the call before it completed.
    #[error("assessment cancelled")]
    Cancelled,
}

impl QualityError {
    /// Returns true if the same call may succeed when issued again later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ResourceAllocationFailed(_))
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }
}

/// A batch item whose file could not be read or decoded.
///
/// Sources return it so the batch can still report the item by path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load {path}: {reason}")]
pub struct ImageLoadError {
    pub path: String,
    pub reason: String,
}

impl ImageLoadError {
    #[must_use]
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
