//! Text extraction from uploaded documents.
//!
//! Every supported document kind is identified by a [`FormatTag`]. The set is closed: a MIME type
//! or extension outside it is rejected with [`ExtractionError::UnsupportedFormat`] before any bytes
//! are read. Extraction never retries; corrupt input surfaces as [`ExtractionError::Failed`].
//!
//! Empty output is valid (an image-only PDF has no text layer) and is returned as-is.

mod pdf;
mod spreadsheet;
mod word;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// MIME type of PDF documents.
pub const PDF_MIME_TYPE: &str = "application/pdf";
/// MIME type of Word 97-2003 documents.
pub const LEGACY_WORD_MIME_TYPE: &str = "application/msword";
/// MIME type of Office Open XML word processing documents.
pub const WORD_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
/// MIME type of Excel 97-2003 workbooks.
pub const LEGACY_SPREADSHEET_MIME_TYPE: &str = "application/vnd.ms-excel";
/// MIME type of Office Open XML workbooks.
pub const SPREADSHEET_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// MIME type of plain text.
pub const PLAIN_TEXT_MIME_TYPE: &str = "text/plain";

/// Closed set of document encodings the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatTag {
    /// Portable Document Format.
    Pdf,
    /// Word 97-2003 binary document (`.doc`).
    LegacyWord,
    /// Office Open XML document (`.docx`).
    Word,
    /// Excel 97-2003 binary workbook (`.xls`).
    LegacySpreadsheet,
    /// Office Open XML workbook (`.xlsx`).
    Spreadsheet,
    /// UTF-8 plain text.
    PlainText,
}

impl FormatTag {
    /// All supported tags.
    pub const ALL: [FormatTag; 6] = [
        FormatTag::Pdf,
        FormatTag::LegacyWord,
        FormatTag::Word,
        FormatTag::LegacySpreadsheet,
        FormatTag::Spreadsheet,
        FormatTag::PlainText,
    ];

    /// Resolve a tag from a MIME type. Parameters such as `; charset=utf-8` are ignored.
    pub fn from_mime(mime: &str) -> Result<Self, ExtractionError> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            PDF_MIME_TYPE => Ok(Self::Pdf),
            LEGACY_WORD_MIME_TYPE => Ok(Self::LegacyWord),
            WORD_MIME_TYPE => Ok(Self::Word),
            LEGACY_SPREADSHEET_MIME_TYPE => Ok(Self::LegacySpreadsheet),
            SPREADSHEET_MIME_TYPE => Ok(Self::Spreadsheet),
            PLAIN_TEXT_MIME_TYPE => Ok(Self::PlainText),
            _ => Err(ExtractionError::UnsupportedFormat(mime.to_string())),
        }
    }

    /// Resolve a tag from a file name's extension.
    pub fn from_file_name(file_name: &str) -> Result<Self, ExtractionError> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "doc" => Ok(Self::LegacyWord),
            "docx" => Ok(Self::Word),
            "xls" => Ok(Self::LegacySpreadsheet),
            "xlsx" => Ok(Self::Spreadsheet),
            "txt" => Ok(Self::PlainText),
            _ => Err(ExtractionError::UnsupportedFormat(file_name.to_string())),
        }
    }

    /// Canonical MIME type for the tag.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => PDF_MIME_TYPE,
            Self::LegacyWord => LEGACY_WORD_MIME_TYPE,
            Self::Word => WORD_MIME_TYPE,
            Self::LegacySpreadsheet => LEGACY_SPREADSHEET_MIME_TYPE,
            Self::Spreadsheet => SPREADSHEET_MIME_TYPE,
            Self::PlainText => PLAIN_TEXT_MIME_TYPE,
        }
    }

    /// Short kebab-case name used in logs and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::LegacyWord => "legacy-word",
            Self::Word => "word",
            Self::LegacySpreadsheet => "legacy-spreadsheet",
            Self::Spreadsheet => "spreadsheet",
            Self::PlainText => "plain-text",
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatTag {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .map_or_else(|| Self::from_mime(s), Ok)
    }
}

/// Errors raised while turning document bytes into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The declared format is outside the supported set.
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),
    /// The document could not be read as the declared format.
    #[error("Failed to extract text from {format} document: {message}")]
    Failed {
        /// Format the document was declared as.
        format: FormatTag,
        /// Description of the underlying failure.
        message: String,
    },
}

impl ExtractionError {
    pub(crate) fn failed(format: FormatTag, message: impl Into<String>) -> Self {
        Self::Failed {
            format,
            message: message.into(),
        }
    }
}

/// LibreOffice binary used when none is configured.
pub const DEFAULT_LIBREOFFICE_BINARY: &str = "soffice";

/// Dispatches document bytes to the extractor for their format.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    libreoffice_binary: PathBuf,
    conversion_timeout: Duration,
}

impl TextExtractor {
    /// Create an extractor. Legacy Word documents are converted by `libreoffice_binary`, bounded
    /// by `conversion_timeout`.
    pub fn new(libreoffice_binary: impl Into<PathBuf>, conversion_timeout: Duration) -> Self {
        Self {
            libreoffice_binary: libreoffice_binary.into(),
            conversion_timeout,
        }
    }

    /// Extract plain text from `content` interpreted as `format`.
    ///
    /// Parsing runs on the blocking thread pool. Legacy Word documents are first converted to
    /// `.docx` by a headless LibreOffice process.
    pub async fn extract(
        &self,
        content: Vec<u8>,
        format: FormatTag,
    ) -> Result<String, ExtractionError> {
        let input_bytes = content.len();
        let text = match format {
            FormatTag::LegacyWord => {
                let converted = word::convert_legacy_document(
                    &content,
                    &self.libreoffice_binary,
                    self.conversion_timeout,
                )
                .await?;
                run_blocking(format, move || word::extract_docx(&converted)).await?
            }
            _ => run_blocking(format, move || extract_in_memory(&content, format)).await?,
        };
        tracing::debug!(
            format = %format,
            input_bytes,
            chars = text.chars().count(),
            "Extracted document text"
        );
        Ok(text)
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_LIBREOFFICE_BINARY, Duration::from_secs(120))
    }
}

/// Extract text from formats that can be parsed entirely in memory.
///
/// Legacy Word needs an external conversion and is only handled by [`TextExtractor::extract`].
pub fn extract_in_memory(content: &[u8], format: FormatTag) -> Result<String, ExtractionError> {
    match format {
        FormatTag::Pdf => pdf::extract_text(content),
        FormatTag::Word => word::extract_docx(content),
        FormatTag::LegacySpreadsheet | FormatTag::Spreadsheet => {
            spreadsheet::extract_text(content, format)
        }
        FormatTag::PlainText => String::from_utf8(content.to_vec())
            .map_err(|error| ExtractionError::failed(format, format!("invalid UTF-8: {error}"))),
        FormatTag::LegacyWord => Err(ExtractionError::failed(
            format,
            "legacy Word documents require LibreOffice conversion",
        )),
    }
}

async fn run_blocking<F>(format: FormatTag, job: F) -> Result<String, ExtractionError>
where
    F: FnOnce() -> Result<String, ExtractionError> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|error| ExtractionError::failed(format, format!("extraction task failed: {error}")))?
}
