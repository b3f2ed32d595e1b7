//! Conversion entry points.
//!
//! Every entry point funnels into [`convert_with`], which runs the fixed
//! pipeline on one upload:
//!
//! ```text
//! PdfUpload ─▶ extract_text ─▶ normalize ─▶ reconstruct ─▶ format ─▶ assemble
//!              (text layer      (lines)      (blocks)      (paragraphs) (DOCX)
//!               or OCR)
//! ```
//!
//! [`convert_with`] takes its text-layer extractor and OCR engine as
//! arguments; [`convert_bytes`] supplies pdfium plus the configured OCR
//! backend.

use crate::config::{ConversionConfig, FormattingMode, OcrBackend};
use crate::error::Pdf2DocxError;
use crate::output::{
    suggested_file_name, ConversionStats, ConvertedDocument, DocumentMetadata, DOCX_MIME_TYPE,
};
use crate::pipeline::format::{format_blocks, format_plain, Paragraph};
use crate::pipeline::input::{self, PdfUpload};
use crate::pipeline::normalize::normalize;
use crate::pipeline::reconstruct::reconstruct;
use crate::pipeline::source::{
    extract_text, EmbeddedTextExtractor, OcrEngine, PdfiumTextExtractor,
};
use crate::pipeline::tesseract::TesseractOcr;
use crate::pipeline::vision::VisionOcr;
use crate::pipeline::{assemble, render};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a PDF file or URL to DOCX.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config` — Conversion configuration
///
/// # Errors
/// Upload errors (missing file, not a PDF, failed download) before any
/// extraction; [`Pdf2DocxError::NoTextFound`] when neither the text layer
/// nor OCR produced text; [`Pdf2DocxError::DocumentBuildFailed`] when the
/// DOCX could not be serialised.
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConvertedDocument, Pdf2DocxError> {
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);
    let upload = input::resolve_input(input_str, config.download_timeout_secs).await?;
    convert_bytes(upload, config).await
}

/// Convert an in-memory upload with pdfium and the configured OCR backend.
///
/// # Example
/// ```rust,no_run
/// use pdf2docx::{convert_bytes, ConversionConfig, PdfUpload};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("lecture.pdf")?;
/// let upload = PdfUpload::new("lecture.pdf", bytes)?;
/// let doc = convert_bytes(upload, &ConversionConfig::default()).await?;
/// std::fs::write(&doc.file_name, &doc.bytes)?;
/// # Ok(())
/// # }
/// ```
pub async fn convert_bytes(
    upload: PdfUpload,
    config: &ConversionConfig,
) -> Result<ConvertedDocument, Pdf2DocxError> {
    let extractor = PdfiumTextExtractor::new(config.password.clone());
    match config.ocr_backend {
        OcrBackend::Tesseract => {
            convert_with(upload, &extractor, &TesseractOcr::from_config(config), config).await
        }
        OcrBackend::Vision => {
            convert_with(upload, &extractor, &VisionOcr::from_config(config), config).await
        }
    }
}

/// Convert an upload with caller-supplied extraction collaborators.
pub async fn convert_with<E, O>(
    upload: PdfUpload,
    extractor: &E,
    ocr: &O,
    config: &ConversionConfig,
) -> Result<ConvertedDocument, Pdf2DocxError>
where
    E: EmbeddedTextExtractor,
    O: OcrEngine,
{
    let total_start = Instant::now();
    let progress: ProgressCallback = config
        .progress_callback
        .clone()
        .unwrap_or_else(|| Arc::new(NoopProgressCallback));
    progress.on_conversion_start(upload.file_name());

    // ── Step 1: Extract text ─────────────────────────────────────────────
    let raw = extract_text(
        upload.bytes(),
        upload.file_name(),
        extractor,
        ocr,
        &config.ocr_language,
        &*progress,
    )
    .await?;
    let extraction_duration_ms = total_start.elapsed().as_millis() as u64;

    // ── Step 2: Lines → blocks → paragraphs ──────────────────────────────
    let layout = layout(&raw.text, config);
    if layout.paragraphs.is_empty() {
        // Every line was dropped by the text stages.
        return Err(Pdf2DocxError::NoTextFound {
            file_name: upload.file_name().to_string(),
        });
    }
    debug!(
        "{} lines → {} blocks → {} paragraphs",
        layout.lines,
        layout.blocks,
        layout.paragraphs.len()
    );

    // ── Step 3: Serialise ────────────────────────────────────────────────
    let bytes = assemble::assemble(layout.paragraphs.clone()).await?;

    let stats = ConversionStats {
        source: raw.source,
        raw_chars: raw.text.chars().count(),
        lines: layout.lines,
        blocks: layout.blocks,
        paragraphs: layout.paragraphs.len(),
        docx_bytes: bytes.len(),
        extraction_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} paragraphs from {}, {}ms total",
        stats.paragraphs,
        raw.source.name(),
        stats.total_duration_ms
    );
    progress.on_conversion_complete(raw.source, stats.paragraphs);

    Ok(ConvertedDocument {
        bytes,
        file_name: suggested_file_name(upload.file_name()),
        mime_type: DOCX_MIME_TYPE.to_string(),
        paragraphs: layout.paragraphs,
        stats,
    })
}

/// Convert a PDF and write the DOCX directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConvertedDocument, Pdf2DocxError> {
    let output = convert(input_str, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Pdf2DocxError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("docx.tmp");
    tokio::fs::write(&tmp_path, &output.bytes)
        .await
        .map_err(|e| Pdf2DocxError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Pdf2DocxError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    info!("Wrote {} ({} bytes)", path.display(), output.bytes.len());
    Ok(output)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConvertedDocument, Pdf2DocxError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2DocxError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// Extract PDF metadata without converting content.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, Pdf2DocxError> {
    inspect_with(input_str, &ConversionConfig::default()).await
}

/// [`inspect`] honouring the config's password and download timeout.
pub async fn inspect_with(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<DocumentMetadata, Pdf2DocxError> {
    let upload = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    let file_name = upload.file_name().to_string();
    render::extract_metadata(upload.into_bytes(), file_name, config.password.clone()).await
}

/// Run the text stages (normalise, reconstruct, format) on raw text.
///
/// Pure and synchronous; this is what [`convert_with`] does between text
/// extraction and DOCX serialisation.
pub fn paragraphs_from_text(raw: &str, config: &ConversionConfig) -> Vec<Paragraph> {
    layout(raw, config).paragraphs
}

struct Layout {
    lines: usize,
    blocks: usize,
    paragraphs: Vec<Paragraph>,
}

fn layout(raw: &str, config: &ConversionConfig) -> Layout {
    let lines = normalize(raw);
    match config.formatting {
        FormattingMode::MathAware => {
            let blocks = reconstruct(&lines);
            Layout {
                lines: lines.len(),
                blocks: blocks.len(),
                paragraphs: format_blocks(&blocks, config.space_collapse, config.paragraph_style),
            }
        }
        FormattingMode::Plain => Layout {
            lines: lines.len(),
            blocks: lines.len(),
            paragraphs: format_plain(&lines, config.paragraph_style),
        },
    }
}
