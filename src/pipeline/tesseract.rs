//! Tesseract OCR backend: pdfium-rendered pages fed to the `tesseract` CLI.
//!
//! A session owns one temporary directory. Every page is rendered by pdfium,
//! written there as PNG and recognised with
//!
//! ```text
//! tesseract <page.png> stdout -l <lang>
//! ```
//!
//! Child processes are spawned with `kill_on_drop(true)` and the directory is
//! a [`TempDir`], so cancelling the conversion future leaves neither a
//! tesseract process nor page images behind.

use crate::config::ConversionConfig;
use crate::error::ExtractionError;
use crate::pipeline::encode::png_bytes;
use crate::pipeline::render;
use crate::pipeline::source::{OcrEngine, OcrSession};
use crate::progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

const ENGINE: &str = "tesseract";

/// Starts [`TesseractSession`]s.
#[derive(Clone)]
pub struct TesseractOcr {
    command: String,
    dpi: u32,
    max_pixels: u32,
    password: Option<String>,
    page_timeout: Duration,
    progress: ProgressCallback,
}

impl TesseractOcr {
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            command: config.tesseract_command.clone(),
            dpi: config.dpi,
            max_pixels: config.max_rendered_pixels,
            password: config.password.clone(),
            page_timeout: Duration::from_secs(config.api_timeout_secs),
            progress: config
                .progress_callback
                .clone()
                .unwrap_or_else(|| Arc::new(NoopProgressCallback)),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<std::process::Output, ExtractionError> {
        Command::new(&self.command)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ExtractionError::OcrUnavailable {
                engine: ENGINE.into(),
                detail: format!("cannot run '{}': {}", self.command, e),
            })
    }
}

impl OcrEngine for TesseractOcr {
    type Session = TesseractSession;

    fn name(&self) -> &str {
        ENGINE
    }

    async fn start(&self, language: &str) -> Result<TesseractSession, ExtractionError> {
        let version = self.run(&["--version"]).await?;
        if !version.status.success() {
            return Err(ExtractionError::OcrUnavailable {
                engine: ENGINE.into(),
                detail: format!("'{} --version' exited with {}", self.command, version.status),
            });
        }
        let version_line = String::from_utf8_lossy(&version.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        debug!("Found {}", version_line);

        // Older releases print the list to stderr.
        let langs = self.run(&["--list-langs"]).await?;
        let mut listing = String::from_utf8_lossy(&langs.stdout).into_owned();
        listing.push('\n');
        listing.push_str(&String::from_utf8_lossy(&langs.stderr));
        let missing = missing_languages(language, &listing);
        if !missing.is_empty() {
            return Err(ExtractionError::OcrUnavailable {
                engine: ENGINE.into(),
                detail: format!("language data not installed: {}", missing.join(", ")),
            });
        }

        let workdir = tempfile::Builder::new()
            .prefix("pdf2docx-ocr-")
            .tempdir()
            .map_err(|e| ExtractionError::OcrUnavailable {
                engine: ENGINE.into(),
                detail: format!("cannot create work directory: {}", e),
            })?;
        debug!("OCR work directory: {}", workdir.path().display());

        Ok(TesseractSession {
            engine: self.clone(),
            language: language.to_string(),
            workdir: Some(workdir),
        })
    }
}

/// Languages from a `+`-joined spec that do not appear in `--list-langs` output.
fn missing_languages(language: &str, listing: &str) -> Vec<String> {
    let installed: Vec<&str> = listing
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("List of"))
        .collect();
    language
        .split('+')
        .filter(|lang| !installed.contains(lang))
        .map(str::to_string)
        .collect()
}

/// One started tesseract engine with its own work directory.
pub struct TesseractSession {
    engine: TesseractOcr,
    language: String,
    workdir: Option<TempDir>,
}

impl TesseractSession {
    async fn recognize_page(&self, dir: &Path, page: usize, png: Vec<u8>) -> Result<String, ExtractionError> {
        let image_path = dir.join(format!("page-{:04}.png", page));
        tokio::fs::write(&image_path, png)
            .await
            .map_err(|e| ExtractionError::OcrFailed {
                page,
                detail: format!("cannot write page image: {}", e),
            })?;

        let child = Command::new(&self.engine.command)
            .arg(&image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.engine.page_timeout, child)
            .await
            .map_err(|_| ExtractionError::Timeout {
                page,
                secs: self.engine.page_timeout.as_secs(),
            })?
            .map_err(|e| ExtractionError::OcrFailed {
                page,
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::OcrFailed {
                page,
                detail: format!("tesseract exited with {}: {}", output.status, stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl OcrSession for TesseractSession {
    async fn recognize(&mut self, pdf: &[u8]) -> Result<String, ExtractionError> {
        let dir = match &self.workdir {
            Some(dir) => dir.path().to_path_buf(),
            None => {
                return Err(ExtractionError::OcrUnavailable {
                    engine: ENGINE.into(),
                    detail: "session already terminated".into(),
                })
            }
        };

        let images = render::render_pages(
            pdf.to_vec(),
            self.engine.password.clone(),
            self.engine.dpi,
            self.engine.max_pixels,
        )
        .await?;

        let total = images.len();
        let progress = Arc::clone(&self.engine.progress);
        progress.on_ocr_start(total);
        info!("Running tesseract on {} pages (lang={})", total, self.language);

        let mut texts = Vec::with_capacity(total);
        let mut first_error = None;

        for (idx, image) in images.iter().enumerate() {
            let page = idx + 1;
            progress.on_page_start(page, total);

            let result = match png_bytes(image) {
                Ok(png) => self.recognize_page(&dir, page, png).await,
                Err(e) => Err(ExtractionError::Render {
                    page,
                    detail: e.to_string(),
                }),
            };

            match result {
                Ok(text) => {
                    progress.on_page_complete(page, total, text.len());
                    texts.push(text);
                }
                Err(e) => {
                    warn!("{}", e);
                    progress.on_page_error(page, total, e.to_string());
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
        if let Some(dir) = self.workdir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!("Failed to remove {}: {}", path.display(), e);
            }
        }
    }
}

impl Drop for TesseractSession {
    fn drop(&mut self) {
        if self.workdir.is_some() {
            debug!("Tesseract session dropped without terminate; removing work directory");
        }
    }
}
