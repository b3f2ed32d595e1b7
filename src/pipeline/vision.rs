//! Vision OCR backend: rendered pages transcribed by a multimodal LLM.
//!
//! ## Message Layout
//!
//! Each page is one request containing (in order):
//! 1. **System message** — the transcription prompt (or user-supplied override)
//! 2. **System message** — the expected document language
//! 3. **User message** — the page PNG as a base64 image attachment (empty text)
//!
//! Pages are sent with bounded concurrency (`config.concurrency`) through an
//! ordered `buffered` stream, so the transcript always comes back in page
//! order. Every page gets exactly one call under `api_timeout_secs`; a failed
//! page is reported and skipped, never retried.

use crate::config::ConversionConfig;
use crate::error::ExtractionError;
use crate::pipeline::encode::encode_page;
use crate::pipeline::render;
use crate::pipeline::source::{OcrEngine, OcrSession};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use crate::prompts::{language_hint, DEFAULT_SYSTEM_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const ENGINE: &str = "vision";
const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Starts [`VisionSession`]s.
#[derive(Clone)]
pub struct VisionOcr {
    config: ConversionConfig,
}

impl VisionOcr {
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl OcrEngine for VisionOcr {
    type Session = VisionSession;

    fn name(&self) -> &str {
        ENGINE
    }

    async fn start(&self, language: &str) -> Result<VisionSession, ExtractionError> {
        let provider = resolve_provider(&self.config)?;
        info!(
            "Vision OCR session started (model={})",
            self.config.model.as_deref().unwrap_or("provider default")
        );
        Ok(VisionSession {
            provider: Some(provider),
            language: language.to_string(),
            config: self.config.clone(),
        })
    }
}

/// One resolved vision provider, bound to a single conversion.
pub struct VisionSession {
    provider: Option<Arc<dyn LLMProvider>>,
    language: String,
    config: ConversionConfig,
}

impl OcrSession for VisionSession {
    async fn recognize(&mut self, pdf: &[u8]) -> Result<String, ExtractionError> {
        let provider = match &self.provider {
            Some(p) => Arc::clone(p),
            None => {
                return Err(ExtractionError::OcrUnavailable {
                    engine: ENGINE.into(),
                    detail: "session already terminated".into(),
                })
            }
        };

        let images = render::render_pages(
            pdf.to_vec(),
            self.config.password.clone(),
            self.config.dpi,
            self.config.max_rendered_pixels,
        )
        .await?;

        let mut pages = Vec::with_capacity(images.len());
        for (idx, img) in images.iter().enumerate() {
            let data = encode_page(img).map_err(|e| ExtractionError::Render {
                page: idx + 1,
                detail: e.to_string(),
            })?;
            pages.push(data);
        }
        drop(images);

        let total = pages.len();
        let progress: ProgressCallback = self
            .config
            .progress_callback
            .clone()
            .unwrap_or_else(|| Arc::new(NoopProgressCallback));
        progress.on_ocr_start(total);

        let system_prompt = self
            .config
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
        let hint = language_hint(&self.language);
        let config = &self.config;

        let results: Vec<Result<String, ExtractionError>> =
            stream::iter(pages.into_iter().enumerate().map(|(idx, image)| {
                let provider = Arc::clone(&provider);
                let progress = Arc::clone(&progress);
                let messages = vec![
                    ChatMessage::system(system_prompt.as_str()),
                    ChatMessage::system(hint.as_str()),
                ];
                async move {
                    let page = idx + 1;
                    progress.on_page_start(page, total);
                    let result = transcribe_page(&provider, page, messages, image, config).await;
                    match &result {
                        Ok(text) => progress.on_page_complete(page, total, text.len()),
                        Err(e) => progress.on_page_error(page, total, e.to_string()),
                    }
                    result
                }
            }))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut texts = Vec::with_capacity(total);
        let mut first_error = None;
        for result in results {
            match result {
                Ok(text) => texts.push(text),
                Err(e) => {
                    warn!("{}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if texts.is_empty() => Err(e),
            _ => Ok(texts.join("\n")),
        }
    }

    async fn terminate(mut self) {
        self.provider = None;
        debug!("Vision session released");
    }
}

/// One call, one page. No retries.
async fn transcribe_page(
    provider: &Arc<dyn LLMProvider>,
    page: usize,
    mut messages: Vec<ChatMessage>,
    image: ImageData,
    config: &ConversionConfig,
) -> Result<String, ExtractionError> {
    let start = Instant::now();
    messages.push(ChatMessage::user_with_images("", vec![image]));

    let options = build_options(config);
    let timeout = Duration::from_secs(config.api_timeout_secs);
    let response = tokio::time::timeout(timeout, provider.chat(&messages, Some(&options)))
        .await
        .map_err(|_| ExtractionError::Timeout {
            page,
            secs: timeout.as_secs(),
        })?
        .map_err(|e| ExtractionError::OcrFailed {
            page,
            detail: e.to_string(),
        })?;

    debug!(
        "Page {}: {} input tokens, {} output tokens, {:?}",
        page,
        response.prompt_tokens,
        response.completion_tokens,
        start.elapsed()
    );

    Ok(strip_fences(&response.content))
}

static RE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```[A-Za-z]*[ \t]*\n(.*?)\n?```\s*$").unwrap());

/// Remove a code fence wrapping the whole response, which models add despite
/// being told not to.
fn strip_fences(content: &str) -> String {
    match RE_FENCE.captures(content) {
        Some(caps) => caps[1].to_string(),
        None => content.to_string(),
    }
}

/// Build `CompletionOptions` from the conversion config.
fn build_options(config: &ConversionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

// ── Provider resolution ──────────────────────────────────────────────────────

fn unavailable(detail: String) -> ExtractionError {
    ExtractionError::OcrUnavailable {
        engine: ENGINE.into(),
        detail,
    }
}

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ExtractionError> {
    ProviderFactory::create_llm_provider(provider_name, model)
        .map_err(|e| unavailable(format!("provider '{}': {}", provider_name, e)))
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. `config.provider`, used as-is
/// 2. `config.provider_name` + `config.model` (default model `gpt-4.1-nano`)
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
/// 4. `OPENAI_API_KEY` → OpenAI with the configured or default model
/// 5. `ProviderFactory::from_env` auto-detection
pub fn resolve_provider(config: &ConversionConfig) -> Result<Arc<dyn LLMProvider>, ExtractionError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_vision_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) = ProviderFactory::from_env().map_err(|e| {
        unavailable(format!(
            "no LLM provider could be auto-detected from environment \
             (set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider): {}",
            e
        ))
    })?;

    Ok(llm_provider)
}
