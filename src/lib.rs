//! # pdf2docx
//!
//! Convert PDF documents, including scanned ones, to editable DOCX with
//! formulas kept on one line.
//!
//! ## Why this crate?
//!
//! Text pulled out of a PDF arrives one visual line at a time. Prose survives
//! that; mathematics does not: `f = x + 1` typeset with a tall fraction or
//! operator comes out as four separate lines, and `x∈A∧y∉B` loses all its
//! spacing. This crate rebuilds those expressions with a small set of token
//! heuristics before writing the document.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input       resolve local file, URL or upload; check %PDF magic
//!  ├─ 2. Extract     pdfium text layer, else OCR (tesseract or vision LLM)
//!  ├─ 3. Normalize   strip control chars, NFC, trim, drop empty lines
//!  ├─ 4. Reconstruct merge formula fragments into blocks
//!  ├─ 5. Format      split on bullets, respace operators and parentheses
//!  └─ 6. Assemble    one DOCX paragraph per result (docx-rs)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2docx::{convert_to_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let doc = convert_to_file("lecture.pdf", "lecture.docx", &config).await?;
//!     eprintln!("{} paragraphs via {:?}", doc.stats.paragraphs, doc.stats.source);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2docx` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2docx = { version = "0.1", default-features = false }
//! ```
//!
//! ## OCR Backends
//!
//! | Backend | Needs | Notes |
//! |---------|-------|-------|
//! | `Tesseract` | `tesseract` on `PATH` + language data | Default, offline |
//! | `Vision`    | An LLM API key (`OPENAI_API_KEY`, …) | Better on handwriting and dense math |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, FormattingMode, OcrBackend, ParagraphStyle,
    SpaceCollapse,
};
pub use convert::{
    convert, convert_bytes, convert_sync, convert_to_file, convert_with, inspect, inspect_with,
    paragraphs_from_text,
};
pub use error::{ExtractionError, Pdf2DocxError};
pub use output::{
    suggested_file_name, ConversionStats, ConvertedDocument, DocumentMetadata, DOCX_MIME_TYPE,
};
pub use pipeline::format::Paragraph;
pub use pipeline::input::PdfUpload;
pub use pipeline::source::{
    EmbeddedTextExtractor, OcrEngine, OcrSession, PdfiumTextExtractor, RawPage, TextSource,
};
pub use pipeline::symbols::{is_marker, is_math_symbol, MARKERS, MATH_SYMBOLS};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
