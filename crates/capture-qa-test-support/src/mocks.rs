//! Mock implementations of core port and pipeline traits.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use capture_qa_core::compute::{ComputePipeline, Kernel3x3, Statistics};
use capture_qa_core::domain::{
    CancelToken, ImageInfo, ImageLoadError, ImageView, QualityError, QualityVerdict,
};
use capture_qa_core::ports::{ImageSource, ProgressEvent, ProgressSink, QualityObserver};

/// Mock implementation of `ImageSource` for testing.
///
/// Yields pre-built images, then one [`ImageLoadError`] per registered
/// failure.
pub struct MockImageSource {
    images: Vec<ImageInfo>,
    failures: Vec<ImageLoadError>,
}

impl MockImageSource {
    /// Creates a new mock source with the given images.
    #[must_use]
    pub const fn new(images: Vec<ImageInfo>) -> Self {
        Self {
            images,
            failures: Vec::new(),
        }
    }

    /// Adds an item at `path` that fails to load with `reason`.
    #[must_use]
    pub fn with_failure(mut self, path: impl Into<String>, reason: impl Into<String>) -> Self {
        self.failures.push(ImageLoadError::new(path, reason));
        self
    }
}

impl ImageSource for MockImageSource {
    fn images(&self) -> Box<dyn Iterator<Item = anyhow::Result<ImageInfo>> + Send + '_> {
        let failures = self.failures.iter().cloned().map(|e| Err(e.into()));
        Box::new(self.images.iter().cloned().map(Ok).chain(failures))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.images.len() + self.failures.len())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
pub struct MockProgressSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `Completed` events.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Completed { .. }))
            .count()
    }

    /// Returns the number of `Skipped` events.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Skipped { .. }))
            .count()
    }

    /// Returns the `(accepted, rejected, unscored)` counts from the
    /// `Finished` event, if any.
    #[must_use]
    pub fn finished_counts(&self) -> Option<(usize, usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished {
                accepted,
                rejected,
                unscored,
            } => Some((*accepted, *rejected, *unscored)),
            _ => None,
        })
    }
}

impl Default for MockProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// One observer notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverEvent {
    Brightness(bool),
    Blur(bool),
    Verdict(QualityVerdict),
}

/// Observer that records every notification in order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, event: ObserverEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl QualityObserver for RecordingObserver {
    fn on_brightness_checked(&self, is_dark: bool) {
        self.push(ObserverEvent::Brightness(is_dark));
    }

    fn on_blur_checked(&self, is_blur: bool) {
        self.push(ObserverEvent::Blur(is_blur));
    }

    fn on_verdict(&self, verdict: &QualityVerdict) {
        self.push(ObserverEvent::Verdict(*verdict));
    }
}

/// Pipeline with no device behind it; every upload fails with
/// [`QualityError::ComputeBackendUnavailable`].
#[derive(Debug, Default)]
pub struct UnavailablePipeline {
    attempts: AtomicUsize,
}

impl UnavailablePipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of uploads attempted so far.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl ComputePipeline for UnavailablePipeline {
    type Texture = ();

    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn upload(&self, _image: &ImageView<'_>) -> Result<(), QualityError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(QualityError::ComputeBackendUnavailable(
            "no device in test".into(),
        ))
    }

    fn convolve(&self, _texture: &(), _kernel: &Kernel3x3) -> Result<(), QualityError> {
        Err(QualityError::ComputeBackendUnavailable(
            "no device in test".into(),
        ))
    }

    fn quantize_unorm8(&self, _texture: &()) -> Result<(), QualityError> {
        Err(QualityError::ComputeBackendUnavailable(
            "no device in test".into(),
        ))
    }

    fn reduce_mean_variance(&self, _texture: &()) -> Result<Statistics, QualityError> {
        Err(QualityError::ComputeBackendUnavailable(
            "no device in test".into(),
        ))
    }
}

/// Wraps another pipeline and fails every upload with
/// [`QualityError::ResourceAllocationFailed`] until told to stop.
#[derive(Debug)]
pub struct AllocationFailingPipeline<P> {
    inner: P,
    failing: AtomicBool,
}

impl<P: ComputePipeline> AllocationFailingPipeline<P> {
    /// Starts out failing.
    #[must_use]
    pub const fn new(inner: P) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(true),
        }
    }

    /// Lets later uploads through to the wrapped pipeline.
    pub fn stop_failing(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }
}

impl<P: ComputePipeline> ComputePipeline for AllocationFailingPipeline<P> {
    type Texture = P::Texture;

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn upload(&self, image: &ImageView<'_>) -> Result<P::Texture, QualityError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(QualityError::ResourceAllocationFailed(format!(
                "no room for a {}x{} texture",
                image.width(),
                image.height()
            )));
        }
        self.inner.upload(image)
    }

    fn convolve(
        &self,
        texture: &P::Texture,
        kernel: &Kernel3x3,
    ) -> Result<P::Texture, QualityError> {
        self.inner.convolve(texture, kernel)
    }

    fn quantize_unorm8(&self, texture: &P::Texture) -> Result<P::Texture, QualityError> {
        self.inner.quantize_unorm8(texture)
    }

    fn reduce_mean_variance(&self, texture: &P::Texture) -> Result<Statistics, QualityError> {
        self.inner.reduce_mean_variance(texture)
    }

    fn submit<T>(&self, work: impl FnOnce() -> T) -> T {
        self.inner.submit(work)
    }
}

/// Stage counts recorded by a [`CountingPipeline`].
#[derive(Debug, Default)]
pub struct StageCounts {
    pub submits: AtomicUsize,
    pub uploads: AtomicUsize,
    pub convolutions: AtomicUsize,
    pub reductions: AtomicUsize,
}

/// Wraps another pipeline and counts each stage it runs.
///
/// Can also raise a [`CancelToken`] right after the upload stage, to
/// exercise cancellation in the middle of a stream.
#[derive(Debug)]
pub struct CountingPipeline<P> {
    inner: P,
    counts: Arc<StageCounts>,
    cancel_after_upload: Option<CancelToken>,
}

impl<P: ComputePipeline> CountingPipeline<P> {
    #[must_use]
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            counts: Arc::new(StageCounts::default()),
            cancel_after_upload: None,
        }
    }

    /// Raises `token` once the first upload has completed.
    #[must_use]
    pub fn cancel_after_upload(mut self, token: CancelToken) -> Self {
        self.cancel_after_upload = Some(token);
        self
    }

    /// Shared handle to the counters.
    #[must_use]
    pub fn counts(&self) -> Arc<StageCounts> {
        Arc::clone(&self.counts)
    }
}

impl<P: ComputePipeline> ComputePipeline for CountingPipeline<P> {
    type Texture = P::Texture;

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn upload(&self, image: &ImageView<'_>) -> Result<P::Texture, QualityError> {
        self.counts.uploads.fetch_add(1, Ordering::SeqCst);
        let texture = self.inner.upload(image)?;
        if let Some(token) = &self.cancel_after_upload {
            token.cancel();
        }
        Ok(texture)
    }

    fn convolve(
        &self,
        texture: &P::Texture,
        kernel: &Kernel3x3,
    ) -> Result<P::Texture, QualityError> {
        self.counts.convolutions.fetch_add(1, Ordering::SeqCst);
        self.inner.convolve(texture, kernel)
    }

    fn quantize_unorm8(&self, texture: &P::Texture) -> Result<P::Texture, QualityError> {
        self.inner.quantize_unorm8(texture)
    }

    fn reduce_mean_variance(&self, texture: &P::Texture) -> Result<Statistics, QualityError> {
        self.counts.reductions.fetch_add(1, Ordering::SeqCst);
        self.inner.reduce_mean_variance(texture)
    }

    fn submit<T>(&self, work: impl FnOnce() -> T) -> T {
        self.counts.submits.fetch_add(1, Ordering::SeqCst);
        self.inner.submit(work)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use capture_qa_core::compute::CpuPipeline;

    #[test]
    fn test_mock_image_source_with_failure() {
        let img = image::DynamicImage::new_rgb8(10, 10);
        let source = MockImageSource::new(vec![ImageInfo::new("ok.png", img)])
            .with_failure("bad.png", "corrupt");

        assert_eq!(source.count_hint(), Some(2));
        let items: Vec<_> = source.images().collect();
        assert!(items[0].is_ok());
        let err = items[1].as_ref().unwrap_err();
        assert_eq!(err.downcast_ref::<ImageLoadError>().unwrap().path, "bad.png");
    }

    #[test]
    fn test_mock_progress_sink() {
        let sink = MockProgressSink::new();

        sink.on_event(ProgressEvent::Skipped {
            path: "test.jpg".into(),
            reason: "corrupt".into(),
        });
        sink.on_event(ProgressEvent::Finished {
            accepted: 0,
            rejected: 0,
            unscored: 1,
        });

        assert_eq!(sink.skipped_count(), 1);
        assert_eq!(sink.finished_counts(), Some((0, 0, 1)));
    }

    #[test]
    fn test_recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        observer.on_brightness_checked(true);
        observer.on_blur_checked(false);
        assert_eq!(
            observer.events(),
            vec![ObserverEvent::Brightness(true), ObserverEvent::Blur(false)]
        );
    }

    #[test]
    fn test_counting_pipeline_counts_stages() {
        let data = [0u8; 12];
        let view = ImageView::packed(&data, 2, 2, capture_qa_core::PixelFormat::Rgb8);
        let pipeline = CountingPipeline::new(CpuPipeline::new());
        let counts = pipeline.counts();

        let texture = pipeline.upload(&view).unwrap();
        let filtered = pipeline.convolve(&texture, &capture_qa_core::compute::LAPLACIAN).unwrap();
        pipeline.reduce_mean_variance(&filtered).unwrap();

        assert_eq!(counts.uploads.load(Ordering::SeqCst), 1);
        assert_eq!(counts.convolutions.load(Ordering::SeqCst), 1);
        assert_eq!(counts.reductions.load(Ordering::SeqCst), 1);
        assert_eq!(counts.submits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_allocation_failing_pipeline_recovers() {
        let data = [0u8; 12];
        let view = ImageView::packed(&data, 2, 2, capture_qa_core::PixelFormat::Rgb8);
        let pipeline = AllocationFailingPipeline::new(CpuPipeline::new());

        let err = pipeline.upload(&view).unwrap_err();
        assert!(err.is_retryable());
        pipeline.stop_failing();
        assert!(pipeline.upload(&view).is_ok());
    }
}
