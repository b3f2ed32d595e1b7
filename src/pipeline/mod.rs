//! Pipeline stages for PDF-to-DOCX conversion.
//!
//! Each submodule implements exactly one transformation step. The text
//! stages (`normalize`, `reconstruct`, `format`) are pure functions over
//! strings; everything that touches pdfium, a child process, the network or
//! a zip writer is async.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ source ──▶ normalize ──▶ reconstruct ──▶ format ──▶ assemble
//! (bytes)  (text layer  (lines)       (blocks)        (paragraphs) (DOCX)
//!           or OCR)
//! ```
//!
//! 1. [`input`]       — path, URL or upload → validated `PdfUpload`
//! 2. [`source`]      — pdfium text layer, falling back to OCR
//!    ([`tesseract`] or [`vision`], both fed by [`render`] and [`encode`])
//! 3. [`normalize`]   — control-char stripping, NFC, trimming
//! 4. [`reconstruct`] — greedy merge of formula fragments into blocks
//! 5. [`format`]      — marker splitting and operator spacing rules
//! 6. [`assemble`]    — `docx-rs` serialisation on the blocking pool

pub mod assemble;
pub mod encode;
pub mod format;
pub mod input;
pub mod normalize;
pub mod reconstruct;
pub mod render;
pub mod source;
pub mod symbols;
pub mod tesseract;
pub mod vision;
