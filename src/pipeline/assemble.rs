//! Document assembly: paragraphs → DOCX bytes via `docx-rs`.
//!
//! One paragraph per [`Paragraph`], one run per paragraph. The mapping is
//! deterministic: the same paragraphs always serialise to the same document
//! body. Zip packing is CPU work, so it runs on the blocking pool.

use crate::error::Pdf2DocxError;
use crate::pipeline::format::Paragraph;
use docx_rs::{Docx, LineSpacing, Paragraph as DocxParagraph, Run};
use std::io::Cursor;
use tracing::debug;

/// Serialise paragraphs into a single-section DOCX.
pub async fn assemble(paragraphs: Vec<Paragraph>) -> Result<Vec<u8>, Pdf2DocxError> {
    tokio::task::spawn_blocking(move || assemble_blocking(&paragraphs))
        .await
        .map_err(|e| Pdf2DocxError::Internal(format!("Assembly task panicked: {}", e)))?
}

/// Blocking implementation of [`assemble`].
pub fn assemble_blocking(paragraphs: &[Paragraph]) -> Result<Vec<u8>, Pdf2DocxError> {
    let docx = paragraphs
        .iter()
        .fold(Docx::new(), |docx, p| docx.add_paragraph(to_docx_paragraph(p)));

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| Pdf2DocxError::DocumentBuildFailed {
            detail: e.to_string(),
        })?;

    let bytes = buf.into_inner();
    debug!("Assembled {} paragraphs → {} bytes", paragraphs.len(), bytes.len());
    Ok(bytes)
}

fn to_docx_paragraph(p: &Paragraph) -> DocxParagraph {
    DocxParagraph::new()
        .add_run(Run::new().add_text(p.text.as_str()).size(p.font_size_half_points))
        .line_spacing(LineSpacing::new().after(p.spacing_after_twips))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParagraphStyle;
    use docx_rs::{read_docx, DocumentChild};

    fn paragraph_count(bytes: &[u8]) -> usize {
        let docx = read_docx(bytes).expect("valid docx");
        docx.document
            .children
            .iter()
            .filter(|c| matches!(c, DocumentChild::Paragraph(_)))
            .count()
    }

    #[test]
    fn output_is_a_zip_with_one_paragraph_each() {
        let style = ParagraphStyle::default();
        let paragraphs = vec![
            Paragraph::new("f = x + 1", style),
            Paragraph::new("● item one", style),
        ];
        let bytes = assemble_blocking(&paragraphs).unwrap();
        assert_eq!(&bytes[..2], b"PK");
        assert_eq!(paragraph_count(&bytes), 2);
    }

    #[test]
    fn empty_paragraph_list_is_a_valid_document() {
        let bytes = assemble_blocking(&[]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
        assert_eq!(paragraph_count(&bytes), 0);
    }

    #[tokio::test]
    async fn async_wrapper_matches_blocking() {
        let paragraphs = vec![Paragraph::new("x ∈ A", ParagraphStyle::default())];
        let bytes = assemble(paragraphs).await.unwrap();
        assert_eq!(paragraph_count(&bytes), 1);
    }
}
