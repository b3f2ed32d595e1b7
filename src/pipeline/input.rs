//! Input resolution: a path, a URL or an in-memory upload → [`PdfUpload`].
//!
//! Everything downstream works on bytes (pdfium loads from a byte vector),
//! so a URL is downloaded straight into memory and a local file is read
//! whole. The `%PDF` magic check happens once, in [`PdfUpload::new`], so
//! every entry point rejects non-PDF input the same way before any
//! extraction is attempted.

use crate::error::Pdf2DocxError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A PDF to convert: its original file name and raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct PdfUpload {
    file_name: String,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for PdfUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfUpload")
            .field("file_name", &self.file_name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

impl PdfUpload {
    /// Validate an upload.
    ///
    /// Empty bytes are [`Pdf2DocxError::InvalidUpload`]; bytes not starting
    /// with `%PDF` are [`Pdf2DocxError::NotAPdf`].
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, Pdf2DocxError> {
        let mut file_name = file_name.into();
        if file_name.trim().is_empty() {
            file_name = "document.pdf".to_string();
        }

        if bytes.is_empty() {
            return Err(Pdf2DocxError::InvalidUpload {
                reason: format!("'{}' is empty", file_name),
            });
        }

        if !bytes.starts_with(b"%PDF") {
            return Err(Pdf2DocxError::NotAPdf {
                file_name,
                magic: bytes.iter().take(4).copied().collect(),
            });
        }

        Ok(Self { file_name, bytes })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a path or URL to a validated upload.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<PdfUpload, Pdf2DocxError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else if input.trim().is_empty() {
        Err(Pdf2DocxError::InvalidInput {
            input: input.to_string(),
        })
    } else {
        read_local(Path::new(input)).await
    }
}

async fn read_local(path: &Path) -> Result<PdfUpload, Pdf2DocxError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Pdf2DocxError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Pdf2DocxError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    PdfUpload::new(file_name, bytes)
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<PdfUpload, Pdf2DocxError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Pdf2DocxError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let map_err = |e: reqwest::Error| {
        if e.is_timeout() {
            Pdf2DocxError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Pdf2DocxError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(map_err)?;

    if !response.status().is_success() {
        return Err(Pdf2DocxError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(map_err)?;
    info!("Downloaded {} bytes", bytes.len());

    PdfUpload::new(extract_filename(url), bytes.to_vec())
}

/// File name from the last URL path segment containing a `.`, else
/// `downloaded.pdf`.
pub fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

/// Default output location for `input`: the suggested DOCX name in `dir`.
pub fn default_output_path(input: &str, dir: &Path) -> PathBuf {
    let original = if is_url(input) {
        extract_filename(input)
    } else {
        Path::new(input)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string())
    };
    dir.join(crate::output::suggested_file_name(&original))
}
