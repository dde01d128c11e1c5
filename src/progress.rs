//! Progress-callback trait for batch conversion events.
//!
//! Pass an [`Arc<dyn ConversionProgressCallback>`] to
//! [`crate::convert::convert_batch`] to receive events as each item of a
//! batch starts and finishes, or to [`crate::convert::pdf_to_jpg_with_progress`]
//! to hear about every rendered page.
//!
//! # Example
//!
//! ```rust
//! use edgequake_fileconv::ConversionProgressCallback;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_item_complete(&self, index: usize, name: &str, output_bytes: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("#{} {} done ({} bytes)", index, name, output_bytes);
//!     }
//! }
//!
//! let counter: Arc<dyn ConversionProgressCallback> = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//! counter.on_item_complete(0, "photo.jpg", 1024);
//! ```

use std::sync::Arc;

/// Called by batch conversions as they process each item.
///
/// Items of a batch run concurrently, so `on_item_*` may be called from
/// different tasks at once; implementations must synchronise shared state.
/// All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before any item starts.
    fn on_batch_start(&self, total_items: usize) {
        let _ = total_items;
    }

    /// Called when an item's transform begins.
    ///
    /// # Arguments
    /// * `index` — 0-indexed position of the item in the batch
    /// * `name`  — the item's file name
    fn on_item_start(&self, index: usize, name: &str) {
        let _ = (index, name);
    }

    /// Called when an item produced its artifact.
    ///
    /// # Arguments
    /// * `index`        — 0-indexed position of the item in the batch
    /// * `name`         — the item's file name
    /// * `output_bytes` — total size of the produced artifact(s)
    fn on_item_complete(&self, index: usize, name: &str, output_bytes: usize) {
        let _ = (index, name, output_bytes);
    }

    /// Called when an item failed.
    fn on_item_error(&self, index: usize, name: &str, error: &str) {
        let _ = (index, name, error);
    }

    /// Called for each page rasterised by PDF→JPG.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — pages in the document
    fn on_page_rendered(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called once after every item has been attempted.
    fn on_batch_complete(&self, total_items: usize, success_count: usize) {
        let _ = (total_items, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Shared callback handle.
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        pages: AtomicUsize,
        succeeded: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_item_start(&self, _index: usize, _name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_item_complete(&self, _index: usize, _name: &str, _output_bytes: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_item_error(&self, _index: usize, _name: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_rendered(&self, _page_num: usize, _total_pages: usize) {
            self.pages.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _total_items: usize, success_count: usize) {
            self.succeeded.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_item_start(0, "a.jpg");
        cb.on_item_complete(0, "a.jpg", 42);
        cb.on_item_error(1, "b.jpg", "decode failed");
        cb.on_page_rendered(1, 3);
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_item_start(0, "a.png");
        tracker.on_item_complete(0, "a.png", 100);
        tracker.on_item_start(1, "b.png");
        tracker.on_item_error(1, "b.png", "truncated");
        tracker.on_page_rendered(1, 1);
        tracker.on_batch_complete(2, 1);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.pages.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.succeeded.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_item_complete(3, "c.webp", 512);
    }
}
