//! Text extraction: turns an uploaded document into plain text for prompting.
//!
//! `TextExtractor` is the seam; `DocumentTextExtractor` is the default backend
//! (pdf-extract for PDF, the DOCX body XML for Word files, strict UTF-8 for text).
//! `AppState` holds an `Arc<dyn TextExtractor>`.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod docx;

/// Kind of document, derived from the upload's file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Pdf,
    Docx,
    Text,
}

impl FileKind {
    /// Resolves a file kind from the extension (`pdf`, `docx`, `txt`), case-insensitively.
    pub fn from_file_name(file_name: &str) -> Result<Self, ExtractionError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(FileKind::Pdf),
            "docx" => Ok(FileKind::Docx),
            "txt" => Ok(FileKind::Text),
            "" => Err(ExtractionError::UnsupportedFileType(file_name.to_string())),
            other => Err(ExtractionError::UnsupportedFileType(other.to_string())),
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileKind::Pdf => "PDF",
            FileKind::Docx => "DOCX",
            FileKind::Text => "text",
        })
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0} (expected pdf, docx or txt)")]
    UnsupportedFileType(String),

    #[error("Could not read PDF: {0}")]
    Pdf(String),

    #[error("Could not read DOCX: {0}")]
    Docx(String),

    #[error("Text file is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("No text could be extracted from the {0} file")]
    Empty(FileKind),
}

pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8], kind: FileKind) -> Result<String, ExtractionError>;
}

/// Default extractor backed by pdf-extract and the DOCX reader in `docx`.
pub struct DocumentTextExtractor;

impl TextExtractor for DocumentTextExtractor {
    fn extract(&self, bytes: &[u8], kind: FileKind) -> Result<String, ExtractionError> {
        let text = match kind {
            FileKind::Pdf => extract_pdf_text(bytes)?,
            FileKind::Docx => docx::extract_docx_text(bytes)?,
            FileKind::Text => String::from_utf8(bytes.to_vec())?,
        };

        let text = normalize_whitespace(&text);
        if text.is_empty() {
            return Err(ExtractionError::Empty(kind));
        }

        debug!("Extracted {} chars from {} upload", text.len(), kind);
        Ok(text)
    }
}

// pdf-extract panics on some malformed inputs instead of returning an error.
fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractionError::Pdf(e.to_string())),
        Err(_) => Err(ExtractionError::Pdf("malformed document".to_string())),
    }
}

/// Trims line endings and collapses runs of blank lines into one.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = false;
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run = true;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if blank_run {
                out.push('\n');
            }
        }
        blank_run = false;
        out.push_str(line);
    }
    out
}
