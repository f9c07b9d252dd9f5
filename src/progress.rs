//! Progress-callback trait for pipeline and per-page assembly events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::convert::Pipeline::with_progress`] to receive events as the
//! pipeline moves through its stages and places each page.
//!
//! # Example
//!
//! ```rust
//! use album2pdf::PipelineProgressCallback;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingCallback {
//!     placed: AtomicUsize,
//! }
//!
//! impl PipelineProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total: usize) {
//!         self.placed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num}/{total} placed");
//!     }
//! }
//! ```

use crate::convert::PipelineState;
use std::sync::Arc;

/// Called by the pipeline as it runs.
///
/// Assembly runs on a blocking worker thread, so implementations must be
/// `Send + Sync`. All methods have default no-op implementations so callers
/// only override what they care about.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called on every state transition, including the final one.
    fn on_state_change(&self, state: PipelineState) {
        let _ = state;
    }

    /// Called once before the first page is decoded.
    ///
    /// # Arguments
    /// * `total_images`: number of images the collector found
    fn on_assembly_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called after a page has been appended to the document.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed position in the collected image list
    /// * `total`   : number of collected images
    fn on_page_complete(&self, page_num: usize, total: usize) {
        let _ = (page_num, total);
    }

    /// Called when an image is skipped.
    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let _ = (page_num, total, error);
    }

    /// Called once after every image has been attempted.
    ///
    /// # Arguments
    /// * `total` : number of collected images
    /// * `placed`: pages actually written
    fn on_assembly_complete(&self, total: usize, placed: usize) {
        let _ = (total, placed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias for the shared callback handle.
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        states: Mutex<Vec<PipelineState>>,
        completes: AtomicUsize,
        errors: AtomicUsize,
        placed: AtomicUsize,
    }

    impl PipelineProgressCallback for TrackingCallback {
        fn on_state_change(&self, state: PipelineState) {
            self.states.lock().unwrap().push(state);
        }

        fn on_page_complete(&self, _page_num: usize, _total: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_error(&self, _page_num: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_assembly_complete(&self, _total: usize, placed: usize) {
            self.placed.store(placed, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_state_change(PipelineState::Fetching);
        cb.on_assembly_start(5);
        cb.on_page_complete(1, 5);
        cb.on_page_error(2, 5, "bad header");
        cb.on_assembly_complete(5, 4);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_state_change(PipelineState::Fetching);
        tracker.on_state_change(PipelineState::Assembling);
        tracker.on_page_complete(1, 3);
        tracker.on_page_error(2, 3, "decode failed");
        tracker.on_page_complete(3, 3);
        tracker.on_assembly_complete(3, 2);

        assert_eq!(
            *tracker.states.lock().unwrap(),
            vec![PipelineState::Fetching, PipelineState::Assembling]
        );
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.placed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_assembly_start(10);
        cb.on_page_complete(1, 10);
    }
}
