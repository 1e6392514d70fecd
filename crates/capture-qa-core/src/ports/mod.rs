//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the pipeline core and the
//! capture/UI layer or batch adapters around it.

mod image_source;
mod observer;
mod progress;
mod result_output;

pub use image_source::ImageSource;
pub use observer::{NullObserver, QualityObserver};
pub use progress::{ProgressEvent, ProgressSink};
pub use result_output::ResultOutput;
