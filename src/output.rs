//! Output types returned by the conversion entry points.

use crate::pipeline::format::Paragraph;
use crate::pipeline::source::TextSource;
use serde::{Deserialize, Serialize};

/// MIME type of the produced document.
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// A successfully converted document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertedDocument {
    /// Serialised DOCX (a zip archive).
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Suggested download name, e.g. `lecture-3.docx`.
    pub file_name: String,
    pub mime_type: String,
    /// The paragraphs written to the document, in order.
    pub paragraphs: Vec<Paragraph>,
    pub stats: ConversionStats,
}

/// Counters and timings for one conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Which strategy supplied the text.
    pub source: TextSource,
    /// Characters in the raw extracted text.
    pub raw_chars: usize,
    /// Non-empty lines after normalisation.
    pub lines: usize,
    /// Blocks after paragraph reconstruction (equals `lines` in plain mode).
    pub blocks: usize,
    pub paragraphs: usize,
    /// DOCX size in bytes.
    pub docx_bytes: usize,
    pub extraction_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// PDF document metadata extracted by pdfium.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub file_name: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
    /// True if at least one page carries a non-blank text layer, i.e. the
    /// conversion will not need OCR.
    pub has_text_layer: bool,
}

/// Output file name for an uploaded `original` name.
///
/// A trailing `.pdf` (any case) is replaced by `.docx`; any other name gets
/// `.docx` appended.
pub fn suggested_file_name(original: &str) -> String {
    let trimmed = original.trim();
    let stem = match trimmed.len().checked_sub(4) {
        Some(cut) if trimmed.is_char_boundary(cut) && trimmed[cut..].eq_ignore_ascii_case(".pdf") => {
            &trimmed[..cut]
        }
        _ => trimmed,
    };
    let stem = if stem.is_empty() { "document" } else { stem };
    format!("{}.docx", stem)
}
