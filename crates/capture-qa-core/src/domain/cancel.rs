//! Cooperative cancellation for pending assessments.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::QualityError;

/// Shared flag a capture layer raises when its session is torn down.
///
/// Clones observe the same flag. The pipeline polls it between compute
/// stages; a stage already submitted to the device runs to completion but
/// its result is discarded.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Returns `Err(Cancelled)` once the token has been raised.
    ///
    /// # Errors
    ///
    /// Returns [`QualityError::Cancelled`] after [`cancel`](Self::cancel).
    pub fn check(&self) -> Result<(), QualityError> {
        if self.is_cancelled() {
            Err(QualityError::Cancelled)
        } else {
            Ok(())
        }
    }
}
