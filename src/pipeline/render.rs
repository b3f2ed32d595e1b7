//! pdfium access: text layer, page rasterisation and document metadata.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! Every public function here moves its work onto Tokio's blocking pool and
//! binds pdfium there, through `pdfium-auto` so the shared library is found
//! (or downloaded once) without `LD_LIBRARY_PATH`.
//!
//! ## DPI and the pixel cap
//!
//! Pages are rendered at the configured DPI, computed from the page width in
//! points. `max_rendered_pixels` then caps both edges: an A0 poster at 300 DPI
//! would otherwise be a ~10,000 × 14,000 px bitmap.

use crate::error::{ExtractionError, Pdf2DocxError};
use crate::output::DocumentMetadata;
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, info, warn};

/// Read the text layer of every page, joined with `\n`.
pub async fn extract_text_layer(
    pdf: Vec<u8>,
    password: Option<String>,
) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_text_layer_blocking(pdf, password.as_deref()))
        .await
        .map_err(|e| ExtractionError::EmbeddedText {
            detail: format!("text extraction task panicked: {}", e),
        })?
}

fn extract_text_layer_blocking(
    pdf: Vec<u8>,
    password: Option<&str>,
) -> Result<String, ExtractionError> {
    let pdfium = bind().map_err(|detail| ExtractionError::EmbeddedText { detail })?;
    let document = pdfium
        .load_pdf_from_byte_vec(pdf, password)
        .map_err(|e| ExtractionError::EmbeddedText {
            detail: load_error_detail(&e, password),
        })?;

    let pages = document.pages();
    let mut texts = Vec::with_capacity(pages.len() as usize);

    for (idx, page) in pages.iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| ExtractionError::EmbeddedText {
                detail: format!("page {}: {:?}", idx + 1, e),
            })?
            .all();
        debug!("Page {} text layer: {} chars", idx + 1, text.len());
        texts.push(text);
    }

    Ok(texts.join("\n"))
}

/// Rasterise every page of the document, in page order.
pub async fn render_pages(
    pdf: Vec<u8>,
    password: Option<String>,
    dpi: u32,
    max_pixels: u32,
) -> Result<Vec<DynamicImage>, ExtractionError> {
    tokio::task::spawn_blocking(move || {
        render_pages_blocking(pdf, password.as_deref(), dpi, max_pixels)
    })
    .await
    .map_err(|e| ExtractionError::Render {
        page: 0,
        detail: format!("render task panicked: {}", e),
    })?
}

fn render_pages_blocking(
    pdf: Vec<u8>,
    password: Option<&str>,
    dpi: u32,
    max_pixels: u32,
) -> Result<Vec<DynamicImage>, ExtractionError> {
    let pdfium = bind().map_err(|detail| ExtractionError::Render { page: 0, detail })?;
    let document = pdfium
        .load_pdf_from_byte_vec(pdf, password)
        .map_err(|e| ExtractionError::Render {
            page: 0,
            detail: load_error_detail(&e, password),
        })?;

    let pages = document.pages();
    info!("Rendering {} pages at {} DPI", pages.len(), dpi);

    let mut images = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        let width = target_width(page.width().value, dpi, max_pixels);
        let render_config = PdfRenderConfig::new()
            .set_target_width(width)
            .set_maximum_height(max_pixels as i32);

        let image = page
            .render_with_config(&render_config)
            .map_err(|e| ExtractionError::Render {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?
            .as_image();

        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );
        images.push(image);
    }

    Ok(images)
}

/// Pixel width for a page `width_pt` points wide at `dpi`, capped at `max_pixels`.
fn target_width(width_pt: f32, dpi: u32, max_pixels: u32) -> i32 {
    let px = (width_pt / 72.0 * dpi as f32).round() as i32;
    px.clamp(1, max_pixels as i32)
}

/// Extract document metadata without rendering pages.
pub async fn extract_metadata(
    pdf: Vec<u8>,
    file_name: String,
    password: Option<String>,
) -> Result<DocumentMetadata, Pdf2DocxError> {
    tokio::task::spawn_blocking(move || {
        extract_metadata_blocking(pdf, &file_name, password.as_deref())
    })
    .await
    .map_err(|e| Pdf2DocxError::Internal(format!("Metadata task panicked: {}", e)))?
}

fn extract_metadata_blocking(
    pdf: Vec<u8>,
    file_name: &str,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2DocxError> {
    let pdfium = bind().map_err(Pdf2DocxError::Internal)?;
    let document =
        pdfium
            .load_pdf_from_byte_vec(pdf, password)
            .map_err(|e| Pdf2DocxError::CorruptPdf {
                file_name: file_name.to_string(),
                detail: load_error_detail(&e, password),
            })?;

    let metadata = document.metadata();
    let pages = document.pages();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().trim().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    let has_text_layer = pages
        .iter()
        .any(|page| page.text().map(|t| !t.all().trim().is_empty()).unwrap_or(false));

    Ok(DocumentMetadata {
        file_name: file_name.to_string(),
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: pages.len() as usize,
        pdf_version: format!("{:?}", document.version()),
        has_text_layer,
    })
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn bind() -> Result<Pdfium, String> {
    pdfium_auto::bind_pdfium_silent().map_err(|e| {
        warn!("pdfium unavailable: {}", e);
        format!("pdfium unavailable: {}", e)
    })
}

fn load_error_detail(e: &PdfiumError, password: Option<&str>) -> String {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            "incorrect password".to_string()
        } else {
            "document is password-protected".to_string()
        }
    } else {
        err_str
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_page_at_300_dpi() {
        // 8.5in × 72pt
        assert_eq!(target_width(612.0, 300, 3000), 2550);
    }

    #[test]
    fn width_is_capped() {
        assert_eq!(target_width(2384.0, 300, 3000), 3000);
        assert_eq!(target_width(612.0, 72, 100), 100);
    }

    #[test]
    fn width_never_zero() {
        assert_eq!(target_width(0.0, 300, 3000), 1);
    }
}
