//! Configuration types for PDF-to-DOCX conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. One struct holds every knob so a
//! config can be shared across requests, logged with `{:?}`, and diffed
//! between two runs that produced different documents.

use crate::error::Pdf2DocxError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for a PDF-to-DOCX conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2docx::{ConversionConfig, OcrBackend, SpaceCollapse};
///
/// let config = ConversionConfig::builder()
///     .ocr_backend(OcrBackend::Tesseract)
///     .ocr_language("eng")
///     .space_collapse(SpaceCollapse::All)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Engine used when the PDF has no usable text layer. Default: Tesseract.
    pub ocr_backend: OcrBackend,

    /// OCR language code (Tesseract traineddata name). Default: `"eng"`.
    ///
    /// Also passed to the vision backend as the expected document language.
    pub ocr_language: String,

    /// Name or path of the tesseract executable. Default: `"tesseract"`.
    pub tesseract_command: String,

    /// Rasterisation DPI for OCR. Range: 72–400. Default: 300.
    ///
    /// Tesseract accuracy drops sharply below ~200 DPI on body text.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 3000.
    ///
    /// Caps memory on oversized pages regardless of DPI.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Paragraph reconstruction strategy. Default: [`FormattingMode::MathAware`].
    pub formatting: FormattingMode,

    /// Whitespace collapse policy for the math formatter. Default: [`SpaceCollapse::All`].
    pub space_collapse: SpaceCollapse,

    /// Display attributes applied to every emitted paragraph.
    pub paragraph_style: ParagraphStyle,

    /// Concurrent page recognitions for the vision backend. Default: 4.
    pub concurrency: usize,

    /// Vision model identifier, e.g. "gpt-4.1-nano". If None, uses provider default.
    pub model: Option<String>,

    /// Vision provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for vision transcription. Default: 0.0.
    pub temperature: f32,

    /// Maximum tokens the vision model may generate per page. Default: 4096.
    pub max_tokens: usize,

    /// Custom transcription prompt for the vision backend.
    pub system_prompt: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-page OCR call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            ocr_backend: OcrBackend::default(),
            ocr_language: "eng".to_string(),
            tesseract_command: "tesseract".to_string(),
            dpi: 300,
            max_rendered_pixels: 3000,
            password: None,
            formatting: FormattingMode::default(),
            space_collapse: SpaceCollapse::default(),
            paragraph_style: ParagraphStyle::default(),
            concurrency: 4,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 4096,
            system_prompt: None,
            download_timeout_secs: 120,
            api_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("ocr_backend", &self.ocr_backend)
            .field("ocr_language", &self.ocr_language)
            .field("tesseract_command", &self.tesseract_command)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("formatting", &self.formatting)
            .field("space_collapse", &self.space_collapse)
            .field("paragraph_style", &self.paragraph_style)
            .field("concurrency", &self.concurrency)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("progress_callback", &self.progress_callback.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn ocr_backend(mut self, backend: OcrBackend) -> Self {
        self.config.ocr_backend = backend;
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn tesseract_command(mut self, cmd: impl Into<String>) -> Self {
        self.config.tesseract_command = cmd.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn formatting(mut self, mode: FormattingMode) -> Self {
        self.config.formatting = mode;
        self
    }

    pub fn space_collapse(mut self, policy: SpaceCollapse) -> Self {
        self.config.space_collapse = policy;
        self
    }

    pub fn paragraph_style(mut self, style: ParagraphStyle) -> Self {
        self.config.paragraph_style = style;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2DocxError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(Pdf2DocxError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.ocr_language.trim().is_empty() {
            return Err(Pdf2DocxError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if !c
            .ocr_language
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '+')
        {
            return Err(Pdf2DocxError::InvalidConfig(format!(
                "OCR language '{}' is not a valid traineddata name",
                c.ocr_language
            )));
        }
        if c.paragraph_style.font_size_half_points == 0 {
            return Err(Pdf2DocxError::InvalidConfig(
                "Font size must be ≥ 1 half-point".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which OCR engine runs when the PDF has no usable text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OcrBackend {
    /// Local `tesseract` executable on pdfium-rendered page images. (default)
    #[default]
    Tesseract,
    /// Vision LLM transcription of the rendered pages via `edgequake-llm`.
    Vision,
}

impl OcrBackend {
    pub fn name(&self) -> &'static str {
        match self {
            OcrBackend::Tesseract => "tesseract",
            OcrBackend::Vision => "vision",
        }
    }
}

/// How extracted lines become paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FormattingMode {
    /// Merge broken formula lines, split on bullet markers and respace
    /// operators. (default)
    #[default]
    MathAware,
    /// One paragraph per cleaned line, no merging and no operator rules.
    Plain,
}

/// Whitespace collapse policy used by the math formatter.
///
/// `FirstRunOnly` reproduces the historical single-shot replacement, which
/// leaves every run of spaces after the first one untouched. `All` collapses
/// every run and is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpaceCollapse {
    #[default]
    All,
    FirstRunOnly,
}

/// Display attributes for every emitted DOCX paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphStyle {
    /// Run font size in half-points (24 = 12 pt).
    pub font_size_half_points: usize,
    /// Space after each paragraph in twentieths of a point (200 = 10 pt).
    pub spacing_after_twips: u32,
}

impl Default for ParagraphStyle {
    fn default() -> Self {
        Self {
            font_size_half_points: 24,
            spacing_after_twips: 200,
        }
    }
}
