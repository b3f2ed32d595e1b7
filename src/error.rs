//! Error types for the pdf2docx library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2DocxError`] — **Fatal**: the conversion cannot produce a document
//!   (bad upload, no text anywhere in the PDF, DOCX serialisation failed).
//!   Returned as `Err(Pdf2DocxError)` from the top-level `convert*` functions.
//!
//! * [`ExtractionError`] — **Non-fatal**: one extraction strategy failed
//!   (no text layer, OCR engine missing, a page would not rasterise). The
//!   text-source adapter logs it and moves on to the next strategy; it only
//!   surfaces indirectly, as [`Pdf2DocxError::NoTextFound`], when every
//!   strategy came back empty.
//!
//! Every fatal error carries an HTTP-equivalent status and a fixed
//! user-facing sentence. The `Display` output may contain paths and library
//! diagnostics and is meant for logs, not for the person who uploaded the file.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2docx library.
#[derive(Debug, Error)]
pub enum Pdf2DocxError {
    // ── Upload errors ─────────────────────────────────────────────────────
    /// The upload was missing or empty.
    #[error("Invalid upload: {reason}")]
    InvalidUpload { reason: String },

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but they are not a PDF.
    #[error("'{file_name}' is not a valid PDF. First bytes: {magic:?}")]
    NotAPdf { file_name: String, magic: Vec<u8> },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// pdfium could not open the document (damaged file, wrong password).
    #[error("Cannot open '{file_name}': {detail}")]
    CorruptPdf { file_name: String, detail: String },

    /// Neither the text layer nor OCR produced any text.
    #[error("No text found in '{file_name}' (text layer and OCR both came back empty)")]
    NoTextFound { file_name: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// docx-rs could not serialise the paragraph sequence.
    #[error("Failed to build DOCX document: {detail}")]
    DocumentBuildFailed { detail: String },

    /// Could not create or write the output DOCX file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2DocxError {
    /// HTTP-equivalent status code for a transport layer sitting on top.
    pub fn status_code(&self) -> u16 {
        match self {
            Pdf2DocxError::InvalidUpload { .. }
            | Pdf2DocxError::InvalidInput { .. }
            | Pdf2DocxError::NotAPdf { .. } => 400,
            Pdf2DocxError::PermissionDenied { .. } => 403,
            Pdf2DocxError::FileNotFound { .. } => 404,
            Pdf2DocxError::NoTextFound { .. } | Pdf2DocxError::CorruptPdf { .. } => 422,
            Pdf2DocxError::DownloadFailed { .. } => 502,
            Pdf2DocxError::DownloadTimeout { .. } => 504,
            Pdf2DocxError::DocumentBuildFailed { .. }
            | Pdf2DocxError::OutputWriteFailed { .. }
            | Pdf2DocxError::InvalidConfig(_)
            | Pdf2DocxError::Internal(_) => 500,
        }
    }

    /// One fixed, human-readable sentence per failure kind.
    ///
    /// Never includes paths, library messages or other internals.
    pub fn user_message(&self) -> &'static str {
        match self {
            Pdf2DocxError::InvalidUpload { .. } | Pdf2DocxError::InvalidInput { .. } => {
                "No file uploaded or invalid file format."
            }
            Pdf2DocxError::NotAPdf { .. } => "The uploaded file is not a PDF document.",
            Pdf2DocxError::FileNotFound { .. } | Pdf2DocxError::PermissionDenied { .. } => {
                "The PDF file could not be opened."
            }
            Pdf2DocxError::DownloadFailed { .. } | Pdf2DocxError::DownloadTimeout { .. } => {
                "The PDF could not be downloaded."
            }
            Pdf2DocxError::NoTextFound { .. } => "Unable to extract text from the PDF.",
            Pdf2DocxError::CorruptPdf { .. } => "The PDF file is damaged or password-protected.",
            Pdf2DocxError::DocumentBuildFailed { .. }
            | Pdf2DocxError::OutputWriteFailed { .. }
            | Pdf2DocxError::InvalidConfig(_)
            | Pdf2DocxError::Internal(_) => "Error processing the PDF file.",
        }
    }

    /// True for the upload/input family (no extraction was attempted).
    pub fn is_upload_error(&self) -> bool {
        matches!(
            self,
            Pdf2DocxError::InvalidUpload { .. }
                | Pdf2DocxError::InvalidInput { .. }
                | Pdf2DocxError::NotAPdf { .. }
                | Pdf2DocxError::FileNotFound { .. }
                | Pdf2DocxError::PermissionDenied { .. }
                | Pdf2DocxError::DownloadFailed { .. }
                | Pdf2DocxError::DownloadTimeout { .. }
        )
    }
}

/// A non-fatal failure of one extraction strategy.
///
/// Logged by [`crate::pipeline::source::extract_text`] and never returned
/// to the caller directly.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ExtractionError {
    /// pdfium could not read the text layer.
    #[error("Text-layer extraction failed: {detail}")]
    EmbeddedText { detail: String },

    /// The OCR engine could not be started (binary missing, language not
    /// installed, no LLM provider configured).
    #[error("OCR engine '{engine}' unavailable: {detail}")]
    OcrUnavailable { engine: String, detail: String },

    /// Recognition failed on a page.
    #[error("OCR failed on page {page}: {detail}")]
    OcrFailed { page: usize, detail: String },

    /// A page could not be rasterised for OCR.
    #[error("Rasterisation failed for page {page}: {detail}")]
    Render { page: usize, detail: String },

    /// A single OCR call exceeded its time budget.
    #[error("OCR call timed out after {secs}s on page {page}")]
    Timeout { page: usize, secs: u64 },
}
