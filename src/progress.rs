//! Progress-callback trait for conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline runs. Embedded-text conversions finish in
//! milliseconds; the page events matter for OCR, which can take seconds per
//! page.
//!
//! # Example
//!
//! ```rust
//! use pdf2docx::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     pages: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("OCR page {}/{} done ({} chars)", page_num, total_pages, text_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     pages: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::source::TextSource;
use std::sync::Arc;

/// Called by the conversion pipeline as it runs.
///
/// Implementations must be `Send + Sync`: the vision backend recognises
/// pages concurrently. All methods have default no-op implementations.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once, before text extraction starts.
    fn on_conversion_start(&self, file_name: &str) {
        let _ = file_name;
    }

    /// Called when extraction falls back to OCR.
    fn on_ocr_fallback(&self, engine: &str) {
        let _ = engine;
    }

    /// Called once the OCR session knows how many pages it will recognise.
    fn on_ocr_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is recognised.
    ///
    /// * `page_num` — 1-indexed page number
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page was recognised.
    ///
    /// * `text_len` — byte length of the recognised text
    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
        let _ = (page_num, total_pages, text_len);
    }

    /// Called when recognition of a page failed.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: String) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once a document was produced.
    ///
    /// * `source`     — which strategy supplied the text
    /// * `paragraphs` — number of paragraphs written
    fn on_conversion_complete(&self, source: TextSource, paragraphs: usize) {
        let _ = (source, paragraphs);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
