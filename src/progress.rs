//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the batch driver works through its files.
//!
//! # Example
//!
//! ```rust
//! use doc2md::{BatchProgressCallback, ConversionConfig};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, input: &Path, _output: &Path, index: usize, total: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {}", index, total, input.display());
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the batch driver as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. With `concurrency > 1` the per-file methods may be
/// called from several tasks at once.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after the pattern has been expanded.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a file is handed to the engine.
    ///
    /// # Arguments
    /// * `input` — file about to be converted
    /// * `index` — 1-indexed position in the batch
    /// * `total` — number of files in the batch
    fn on_file_start(&self, input: &Path, index: usize, total: usize) {
        let _ = (input, index, total);
    }

    /// Called when a file has been converted and written.
    fn on_file_complete(&self, input: &Path, output: &Path, index: usize, total: usize) {
        let _ = (input, output, index, total);
    }

    /// Called when a file fails; the batch continues.
    fn on_file_error(&self, input: &Path, index: usize, total: usize, error: &str) {
        let _ = (input, index, total, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
