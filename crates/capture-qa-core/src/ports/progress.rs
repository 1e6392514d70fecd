//! Progress reporting port for batch front-ends.

use crate::domain::AnalysisResult;

/// Events emitted while a batch of captures is assessed.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Assessment started for an image.
    Started {
        /// Path to the image.
        path: String,
        /// Index in the batch (0-based).
        index: usize,
        /// Total images in batch, if known.
        total: Option<usize>,
    },
    /// An image was scored, or failed to score.
    Completed {
        /// The assessment record.
        result: AnalysisResult,
    },
    /// An image could not be loaded at all.
    Skipped {
        /// Path or index of the image.
        path: String,
        /// Reason for skipping.
        reason: String,
    },
    /// All images have been processed.
    Finished {
        /// Images that passed.
        accepted: usize,
        /// Images flagged dark or blurred.
        rejected: usize,
        /// Images that failed to load or score.
        unscored: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}
