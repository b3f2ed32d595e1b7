//! Text source adapter: embedded text first, OCR as the fallback.
//!
//! ## Lifecycle
//!
//! ```text
//! extractor.extract ──(empty / Err)──▶ ocr.start(lang) ──▶ session.recognize
//!        │                                                     │
//!        ▼                                                     ▼
//!   RawPage(EmbeddedText)                 session.terminate (always) ──▶ RawPage(Ocr)
//! ```
//!
//! Both strategies are attempted at most once per conversion. Strategy
//! failures are [`ExtractionError`]s: logged here and never returned. The
//! only error that leaves this module is [`Pdf2DocxError::NoTextFound`].
//!
//! The traits use return-position `impl Future` so fakes in tests and the
//! pdfium/tesseract/vision implementations need no boxing.

use crate::error::{ExtractionError, Pdf2DocxError};
use crate::pipeline::normalize::normalize;
use crate::pipeline::render;
use crate::progress::ConversionProgressCallback;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, info, warn};

/// Which strategy produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextSource {
    EmbeddedText,
    Ocr,
}

impl TextSource {
    pub fn name(&self) -> &'static str {
        match self {
            TextSource::EmbeddedText => "embedded-text",
            TextSource::Ocr => "ocr",
        }
    }
}

/// The text of the whole document, extracted in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPage {
    pub source: TextSource,
    pub text: String,
}

// ── Collaborator traits ──────────────────────────────────────────────────────

/// Reads the text layer a PDF already carries.
pub trait EmbeddedTextExtractor: Send + Sync {
    fn extract(&self, pdf: &[u8]) -> impl Future<Output = Result<String, ExtractionError>> + Send;
}

/// Factory for OCR sessions.
pub trait OcrEngine: Send + Sync {
    type Session: OcrSession;

    /// Short engine name for logs and progress events.
    fn name(&self) -> &str;

    /// Acquire whatever the engine needs (worker process, temp dir, API
    /// client) for `language`.
    fn start(
        &self,
        language: &str,
    ) -> impl Future<Output = Result<Self::Session, ExtractionError>> + Send;
}

/// One started OCR engine, bound to a single conversion.
///
/// Implementations must release their resources in `terminate`, and again
/// on `Drop` if `terminate` never ran.
pub trait OcrSession: Send {
    fn recognize(
        &mut self,
        pdf: &[u8],
    ) -> impl Future<Output = Result<String, ExtractionError>> + Send;

    fn terminate(self) -> impl Future<Output = ()> + Send;
}

// ── Adapter ──────────────────────────────────────────────────────────────────

/// Extract the document text, falling back to OCR when the text layer is
/// missing, empty or unreadable. A layer holding only control or invisible
/// characters counts as empty.
pub async fn extract_text<E, O>(
    pdf: &[u8],
    file_name: &str,
    extractor: &E,
    ocr: &O,
    language: &str,
    progress: &dyn ConversionProgressCallback,
) -> Result<RawPage, Pdf2DocxError>
where
    E: EmbeddedTextExtractor,
    O: OcrEngine,
{
    match extractor.extract(pdf).await {
        Ok(text) if has_content(&text) => {
            info!("{}: using embedded text ({} chars)", file_name, text.len());
            return Ok(RawPage {
                source: TextSource::EmbeddedText,
                text,
            });
        }
        Ok(_) => info!("{}: no embedded text, falling back to OCR", file_name),
        Err(e) => warn!("{}: {}, falling back to OCR", file_name, e),
    }

    progress.on_ocr_fallback(ocr.name());

    match run_ocr(pdf, ocr, language).await {
        Ok(text) if has_content(&text) => {
            info!("{}: OCR produced {} chars", file_name, text.len());
            Ok(RawPage {
                source: TextSource::Ocr,
                text,
            })
        }
        Ok(_) => {
            warn!("{}: OCR produced no text", file_name);
            Err(Pdf2DocxError::NoTextFound {
                file_name: file_name.to_string(),
            })
        }
        Err(e) => {
            warn!("{}: {}", file_name, e);
            Err(Pdf2DocxError::NoTextFound {
                file_name: file_name.to_string(),
            })
        }
    }
}

/// Whether `text` keeps at least one line once control and invisible
/// characters are stripped.
fn has_content(text: &str) -> bool {
    !normalize(text).is_empty()
}

/// start → recognize → terminate. `terminate` runs whatever `recognize` returned.
async fn run_ocr<O>(pdf: &[u8], ocr: &O, language: &str) -> Result<String, ExtractionError>
where
    O: OcrEngine,
{
    let mut session = ocr.start(language).await?;
    debug!("OCR session started ({}, lang={})", ocr.name(), language);
    let result = session.recognize(pdf).await;
    session.terminate().await;
    debug!("OCR session terminated ({})", ocr.name());
    result
}

// ── pdfium text layer ────────────────────────────────────────────────────────

/// Text layer of every page via pdfium, pages joined with `\n`.
#[derive(Debug, Clone, Default)]
pub struct PdfiumTextExtractor {
    password: Option<String>,
}

impl PdfiumTextExtractor {
    pub fn new(password: Option<String>) -> Self {
        Self { password }
    }
}

impl EmbeddedTextExtractor for PdfiumTextExtractor {
    fn extract(&self, pdf: &[u8]) -> impl Future<Output = Result<String, ExtractionError>> + Send {
        render::extract_text_layer(pdf.to_vec(), self.password.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopProgressCallback;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedText(Result<String, ExtractionError>);

    impl EmbeddedTextExtractor for FixedText {
        async fn extract(&self, _pdf: &[u8]) -> Result<String, ExtractionError> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct Counters {
        starts: AtomicUsize,
        terminates: AtomicUsize,
    }

    struct FakeOcr {
        output: Result<String, ExtractionError>,
        counters: Arc<Counters>,
    }

    struct FakeSession {
        output: Result<String, ExtractionError>,
        counters: Arc<Counters>,
    }

    impl OcrEngine for FakeOcr {
        type Session = FakeSession;

        fn name(&self) -> &str {
            "fake"
        }

        async fn start(&self, _language: &str) -> Result<FakeSession, ExtractionError> {
            self.counters.starts.fetch_add(1, Ordering::SeqCst);
            Ok(FakeSession {
                output: self.output.clone(),
                counters: Arc::clone(&self.counters),
            })
        }
    }

    impl OcrSession for FakeSession {
        async fn recognize(&mut self, _pdf: &[u8]) -> Result<String, ExtractionError> {
            self.output.clone()
        }

        async fn terminate(self) {
            self.counters.terminates.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn ocr(output: Result<String, ExtractionError>) -> (FakeOcr, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        (
            FakeOcr {
                output,
                counters: Arc::clone(&counters),
            },
            counters,
        )
    }

    #[tokio::test]
    async fn embedded_text_skips_ocr() {
        let (engine, counters) = ocr(Ok("unused".into()));
        let page = extract_text(
            b"%PDF",
            "a.pdf",
            &FixedText(Ok("Hello".into())),
            &engine,
            "eng",
            &NoopProgressCallback,
        )
        .await
        .unwrap();
        assert_eq!(page.source, TextSource::EmbeddedText);
        assert_eq!(page.text, "Hello");
        assert_eq!(counters.starts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn whitespace_only_text_layer_falls_back() {
        let (engine, counters) = ocr(Ok("scanned".into()));
        let page = extract_text(
            b"%PDF",
            "a.pdf",
            &FixedText(Ok(" \n\t ".into())),
            &engine,
            "eng",
            &NoopProgressCallback,
        )
        .await
        .unwrap();
        assert_eq!(page.source, TextSource::Ocr);
        assert_eq!(counters.starts.load(Ordering::SeqCst), 1);
        assert_eq!(counters.terminates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recognition_error_still_terminates() {
        let (engine, counters) = ocr(Err(ExtractionError::OcrFailed {
            page: 1,
            detail: "boom".into(),
        }));
        let err = extract_text(
            b"%PDF",
            "scan.pdf",
            &FixedText(Err(ExtractionError::EmbeddedText {
                detail: "no layer".into(),
            })),
            &engine,
            "eng",
            &NoopProgressCallback,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Pdf2DocxError::NoTextFound { ref file_name } if file_name == "scan.pdf"));
        assert_eq!(counters.terminates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invisible_only_text_layer_falls_back() {
        for layer in ["\u{FEFF}", "\u{2}\u{3}", "\u{200B}\n\u{200B}"] {
            let (engine, counters) = ocr(Ok("Scanned text".into()));
            let page = extract_text(
                b"%PDF",
                "a.pdf",
                &FixedText(Ok(layer.into())),
                &engine,
                "eng",
                &NoopProgressCallback,
            )
            .await
            .unwrap();
            assert_eq!(page.source, TextSource::Ocr, "layer {:?}", layer);
            assert_eq!(page.text, "Scanned text");
            assert_eq!(counters.starts.load(Ordering::SeqCst), 1);
            assert_eq!(counters.terminates.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn invisible_only_ocr_output_is_no_text_found() {
        let (engine, counters) = ocr(Ok("\u{FEFF}\n\u{200B}".into()));
        let err = extract_text(
            b"%PDF",
            "scan.pdf",
            &FixedText(Ok(String::new())),
            &engine,
            "eng",
            &NoopProgressCallback,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Pdf2DocxError::NoTextFound { .. }));
        assert_eq!(counters.terminates.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn source_names() {
        assert_eq!(TextSource::EmbeddedText.name(), "embedded-text");
        assert_eq!(TextSource::Ocr.name(), "ocr");
    }
}
