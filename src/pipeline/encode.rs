//! Image encoding for the OCR backends.
//!
//! Both backends consume PNG: tesseract reads it from the session's temp
//! directory, the vision backend sends it base64-wrapped in an `ImageData`.
//! PNG is lossless; JPEG artefacts around glyph edges cost recognition
//! accuracy on both engines.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page as PNG bytes.
pub fn png_bytes(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("Encoded {}x{} page → {} PNG bytes", img.width(), img.height(), buf.len());
    Ok(buf)
}

/// Encode a rasterised page for a vision model request.
///
/// `detail: "high"` lets tiling models see fine print and sub/superscripts;
/// the low-detail single tile loses most formula structure.
pub fn encode_page(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let png = png_bytes(img)?;
    let b64 = STANDARD.encode(&png);
    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}
