//! Test support utilities for capture-qa.
//!
//! Provides mocks, synthetic image builders, and instrumented compute
//! pipelines for testing the quality pipeline.
//!
//! # Example
//!
//! ```
//! use capture_qa_test_support::{MockImageSource, SyntheticImageBuilder};
//!
//! // Create synthetic test images
//! let sharp = SyntheticImageBuilder::checkerboard(128, 128);
//! let dark = SyntheticImageBuilder::black(128, 128);
//!
//! // Create mock image source
//! let source = MockImageSource::new(vec![sharp, dark]);
//! ```

mod builders;
mod mocks;

pub use builders::{PaddedFrame, SyntheticImageBuilder};
pub use mocks::{
    AllocationFailingPipeline, CountingPipeline, MockImageSource, MockProgressSink,
    ObserverEvent, RecordingObserver, StageCounts, UnavailablePipeline,
};
