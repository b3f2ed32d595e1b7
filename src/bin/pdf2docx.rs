//! CLI binary for pdf2docx.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and writes the DOCX.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2docx::pipeline::input::default_output_path;
use pdf2docx::{
    convert_to_file, inspect_with, ConversionConfig, ConversionProgressCallback, FormattingMode,
    OcrBackend, ParagraphStyle, Pdf2DocxError, ProgressCallback, SpaceCollapse, TextSource,
};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback. Shows a spinner while the text layer is read;
/// switches to a page bar only if the conversion falls back to OCR.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-page wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_ms(&self, page_num: usize) -> u128 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut times| times.remove(&page_num))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, file_name: &str) {
        self.bar.set_prefix("Extracting");
        self.bar.set_message(file_name.to_string());
    }

    fn on_ocr_fallback(&self, engine: &str) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("No text layer, running OCR ({engine})…"))
        ));
        self.bar.set_prefix("OCR");
        self.bar.set_message("rendering pages…");
    }

    fn on_ocr_start(&self, total_pages: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_pages as u64);
        self.bar.set_style(progress_style);
        self.bar.reset_eta();
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, text_len: usize) {
        let elapsed_ms = self.elapsed_ms(page_num);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{text_len:>5} chars")),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: String) {
        let elapsed_ms = self.elapsed_ms(page_num);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, source: TextSource, _paragraphs: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if source == TextSource::Ocr && failed > 0 {
            eprintln!(
                "{} {} OCR pages failed and were skipped",
                cyan("⚠"),
                red(&failed.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (writes lecture.docx in the current directory)
  pdf2docx lecture.pdf

  # Choose the output file
  pdf2docx lecture.pdf -o notes/lecture-3.docx

  # Scanned French document
  pdf2docx --lang fra scan.pdf

  # OCR with a vision model instead of tesseract
  pdf2docx --ocr vision --model gpt-4.1-mini scan.pdf

  # One paragraph per extracted line, no formula merging
  pdf2docx --plain report.pdf

  # Convert from URL
  pdf2docx https://example.org/papers/calculus.pdf

  # Inspect PDF metadata (no conversion)
  pdf2docx --inspect-only document.pdf

  # JSON summary (paragraphs and stats) on stdout
  pdf2docx --json document.pdf > summary.json

OCR:
  The text layer is always tried first. OCR only runs when the PDF has no
  extractable text (scans, photographed pages).

  tesseract (default)  needs `tesseract` on PATH and the language data for
                       --lang (check with `tesseract --list-langs`)
  vision               needs an LLM API key; provider resolved from --provider,
                       EDGEQUAKE_LLM_PROVIDER/EDGEQUAKE_MODEL, OPENAI_API_KEY,
                       then any other configured key

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (vision OCR)
  ANTHROPIC_API_KEY       Anthropic API key (vision OCR)
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium — skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                Override log filter (e.g. pdf2docx=debug)
"#;

/// Convert PDF files and URLs to editable DOCX.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2docx",
    version,
    about = "Convert PDF files and URLs to editable DOCX, with OCR fallback and formula repair",
    long_about = "Convert PDF documents (local files or URLs) to DOCX. Text is read from the \
PDF's text layer, or recognised with tesseract or a vision LLM when there is none. Lines broken \
apart by extraction are merged back into formulas and operators are respaced before the \
document is written.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write the DOCX to this file [default: <input name>.docx in the current directory].
    #[arg(short, long, env = "PDF2DOCX_OUTPUT")]
    output: Option<PathBuf>,

    /// OCR engine used when the PDF has no text layer.
    #[arg(long, env = "PDF2DOCX_OCR", value_enum, default_value = "tesseract")]
    ocr: OcrArg,

    /// OCR language (tesseract code, `+`-joined for several: eng+fra).
    #[arg(long, env = "PDF2DOCX_LANG", default_value = "eng")]
    lang: String,

    /// Name or path of the tesseract executable.
    #[arg(long, env = "PDF2DOCX_TESSERACT", default_value = "tesseract")]
    tesseract_cmd: String,

    /// OCR rendering DPI (72–400).
    #[arg(long, env = "PDF2DOCX_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// One paragraph per extracted line; no formula merging or operator spacing.
    #[arg(long, env = "PDF2DOCX_PLAIN")]
    plain: bool,

    /// Collapse only the first run of repeated spaces in each paragraph.
    #[arg(long, env = "PDF2DOCX_FIRST_RUN_COLLAPSE")]
    first_run_collapse: bool,

    /// Font size in points.
    #[arg(long, env = "PDF2DOCX_FONT_SIZE", default_value_t = 12)]
    font_size: usize,

    /// Space after each paragraph in points.
    #[arg(long, env = "PDF2DOCX_SPACING_AFTER", default_value_t = 10)]
    spacing_after: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2DOCX_PASSWORD")]
    password: Option<String>,

    /// Vision model ID (e.g. gpt-4.1-nano, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Vision provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Number of concurrent vision OCR calls.
    #[arg(short, long, env = "PDF2DOCX_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Path to a text file containing a custom vision transcription prompt.
    #[arg(long, env = "PDF2DOCX_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max vision output tokens per page.
    #[arg(long, env = "PDF2DOCX_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Vision temperature (0.0–2.0).
    #[arg(long, env = "PDF2DOCX_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Print a JSON summary (paragraphs and stats) to stdout.
    #[arg(long, env = "PDF2DOCX_JSON")]
    json: bool,

    /// Disable progress output.
    #[arg(long, env = "PDF2DOCX_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2DOCX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2DOCX_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2DOCX_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-page OCR timeout in seconds.
    #[arg(long, env = "PDF2DOCX_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OcrArg {
    Tesseract,
    Vision,
}

impl From<OcrArg> for OcrBackend {
    fn from(v: OcrArg) -> Self {
        match v {
            OcrArg::Tesseract => OcrBackend::Tesseract,
            OcrArg::Vision => OcrBackend::Vision,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Ensure PDFium engine is available ────────────────────────────────
    if !pdfium_auto::is_pdfium_cached() {
        if !cli.quiet {
            let dl_bar = ProgressBar::new(0);
            dl_bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {prefix:.bold}  \
                     [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  ")
                .tick_strings(TICKS),
            );
            dl_bar.set_prefix("PDF engine");
            dl_bar.set_message("Connecting…");
            dl_bar.enable_steady_tick(Duration::from_millis(80));

            let bar = dl_bar.clone();
            tokio::task::block_in_place(|| {
                pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
                    if let Some(t) = total {
                        if bar.length().unwrap_or(0) != t {
                            bar.set_length(t);
                        }
                    }
                    bar.set_position(downloaded);
                }))
            })
            .context("Failed to download PDFium engine")?;

            dl_bar.finish_with_message("ready ✓");
        } else {
            tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
                .context("Failed to download PDFium engine")?;
        }
    }

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, None).await?;
        let meta = inspect_with(&cli.input, &config)
            .await
            .map_err(user_facing)?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", meta.file_name);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            println!(
                "Text layer:   {}",
                if meta.has_text_layer { "yes" } else { "no (OCR needed)" }
            );
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    let output_path = match cli.output {
        Some(ref path) => path.clone(),
        None => default_output_path(&cli.input, Path::new(".")),
    };

    // ── Run conversion ───────────────────────────────────────────────────
    let doc = convert_to_file(&cli.input, &output_path, &config)
        .await
        .map_err(user_facing)?;

    if cli.json {
        let json = serde_json::to_string_pretty(&doc).context("Failed to serialise output")?;
        println!("{json}");
    }

    if !cli.quiet {
        eprintln!(
            "{}  {} paragraphs from {}  {}ms  →  {}",
            green("✔"),
            doc.stats.paragraphs,
            doc.stats.source.name(),
            doc.stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
    }

    Ok(())
}

/// Log the full error, surface only the fixed user message.
fn user_facing(e: Pdf2DocxError) -> anyhow::Error {
    tracing::debug!("{}", e);
    anyhow::anyhow!(e.user_message())
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let formatting = if cli.plain {
        FormattingMode::Plain
    } else {
        FormattingMode::MathAware
    };
    let space_collapse = if cli.first_run_collapse {
        SpaceCollapse::FirstRunOnly
    } else {
        SpaceCollapse::All
    };

    let mut builder = ConversionConfig::builder()
        .ocr_backend(cli.ocr.into())
        .ocr_language(cli.lang.as_str())
        .tesseract_command(cli.tesseract_cmd.as_str())
        .dpi(cli.dpi)
        .formatting(formatting)
        .space_collapse(space_collapse)
        .paragraph_style(ParagraphStyle {
            font_size_half_points: cli.font_size * 2,
            spacing_after_twips: cli.spacing_after * 20,
        })
        .concurrency(cli.concurrency)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    let mut config = builder.build().context("Invalid configuration")?;

    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();
    config.password = cli.password.clone();
    config.system_prompt = system_prompt;

    Ok(config)
}
