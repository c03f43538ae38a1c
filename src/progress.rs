//! Progress-callback trait for per-image extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline works through the input list.
//!
//! Callbacks are the least-invasive integration point: callers can forward
//! events to a terminal progress bar, a log file, or a GUI without the
//! library knowing anything about how the host application communicates.
//! The trait is `Send + Sync` because inputs are processed concurrently.

use std::sync::Arc;

/// Called by the extraction pipeline as it processes each input image.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. With `concurrency > 1`, the per-image methods may
/// be called from different threads at the same time; implementations must
/// protect shared mutable state accordingly.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before any input is processed.
    fn on_batch_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called when an input image starts processing (1-indexed).
    fn on_image_start(&self, image_num: usize, total_images: usize) {
        let _ = (image_num, total_images);
    }

    /// Called when an input image finished successfully, with the number of
    /// cards it produced.
    fn on_image_complete(&self, image_num: usize, total_images: usize, cards: usize) {
        let _ = (image_num, total_images, cards);
    }

    /// Called when an input image failed.
    fn on_image_error(&self, image_num: usize, total_images: usize, error: String) {
        let _ = (image_num, total_images, error);
    }

    /// Called once after every input was processed.
    fn on_batch_complete(&self, total_images: usize, success_count: usize) {
        let _ = (total_images, success_count);
    }
}

/// Shared handle to a progress callback, as stored in the config.
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

/// A callback that ignores every event.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}
