//! Records, filters, and pages exchanged with a [`DocumentRepository`](super::DocumentRepository).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::extraction::FormatTag;
use crate::summarization::DocumentSummary;

/// Lifecycle of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Upload accepted, summary not yet available.
    Processing,
    /// Summary stored.
    Processed,
    /// Text extraction failed.
    Failed,
}

impl DocumentStatus {
    /// Lowercase label used in JSON and query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processing" => Ok(Self::Processing),
            "processed" => Ok(Self::Processed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown document status '{other}'")),
        }
    }
}

/// Catalogue entry for one uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Original file name as uploaded.
    pub filename: String,
    /// Resolved document format.
    pub format: FormatTag,
    /// Size of the original in bytes.
    pub size_bytes: u64,
    /// SHA-256 of the original, hex encoded.
    pub checksum: String,
    /// Location of the staged original.
    pub stored_path: PathBuf,
    /// Current lifecycle state.
    pub status: DocumentStatus,
    /// Upload time.
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    /// Time the summary or failure was recorded.
    #[serde(with = "time::serde::rfc3339::option")]
    pub processed_at: Option<OffsetDateTime>,
    /// Summary, once processed.
    pub summary: Option<DocumentSummary>,
    /// Caller-safe failure description, once failed.
    pub error: Option<String>,
}

impl DocumentRecord {
    /// Record a successful summary.
    pub fn mark_processed(&mut self, summary: DocumentSummary) {
        self.status = DocumentStatus::Processed;
        self.summary = Some(summary);
        self.error = None;
        self.processed_at = Some(OffsetDateTime::now_utc());
    }

    /// Record a failure with a caller-safe message.
    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.status = DocumentStatus::Failed;
        self.summary = None;
        self.error = Some(message.into());
        self.processed_at = Some(OffsetDateTime::now_utc());
    }
}

/// Criteria for listing documents. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    /// Only documents in this state.
    pub status: Option<DocumentStatus>,
    /// Only documents whose summary carries this category (case-insensitive).
    pub category: Option<String>,
    /// Case-insensitive substring of the file name or executive summary.
    pub search: Option<String>,
}

impl DocumentFilter {
    /// Build a filter, dropping blank text criteria.
    pub fn new(
        status: Option<DocumentStatus>,
        category: Option<String>,
        search: Option<String>,
    ) -> Self {
        Self {
            status,
            category: non_empty_lowercase(category),
            search: non_empty_lowercase(search),
        }
    }

    /// Whether `record` satisfies every criterion.
    pub fn matches(&self, record: &DocumentRecord) -> bool {
        if let Some(status) = self.status
            && record.status != status
        {
            return false;
        }

        if let Some(category) = self.category.as_deref() {
            let tagged = record.summary.as_ref().is_some_and(|summary| {
                summary
                    .categories
                    .iter()
                    .any(|candidate| candidate.to_lowercase() == category)
            });
            if !tagged {
                return false;
            }
        }

        if let Some(needle) = self.search.as_deref() {
            let in_name = record.filename.to_lowercase().contains(needle);
            let in_summary = record.summary.as_ref().is_some_and(|summary| {
                summary.executive_summary.to_lowercase().contains(needle)
            });
            if !in_name && !in_summary {
                return false;
            }
        }

        true
    }
}

fn non_empty_lowercase(value: Option<String>) -> Option<String> {
    value
        .map(|input| input.trim().to_lowercase())
        .filter(|input| !input.is_empty())
}

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Page number, starting at 1.
    pub number: usize,
    /// Maximum documents per page.
    pub limit: usize,
}

impl Page {
    /// Documents per page when the caller does not say.
    pub const DEFAULT_LIMIT: usize = 10;
    /// Largest accepted page size.
    pub const MAX_LIMIT: usize = 100;

    /// Build a page, clamping `number` to at least 1 and `limit` to `1..=MAX_LIMIT`.
    pub fn new(number: Option<usize>, limit: Option<usize>) -> Self {
        Self {
            number: number.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Number of records preceding this page.
    pub fn offset(&self) -> usize {
        (self.number - 1).saturating_mul(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// A page of documents, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentPage {
    /// Documents on this page.
    pub documents: Vec<DocumentRecord>,
    /// Documents matching the filter across all pages.
    pub total: usize,
    /// Page number served.
    pub page: usize,
    /// Page size served.
    pub limit: usize,
}


#[cfg(test)]
mod tests {
    use super::fixtures::{record, summary};
    use super::*;

    #[test]
    fn pages_are_clamped() {
        assert_eq!(Page::new(None, None), Page { number: 1, limit: 10 });
        assert_eq!(Page::new(Some(0), Some(0)), Page { number: 1, limit: 1 });
        assert_eq!(Page::new(Some(3), Some(500)).limit, 100);
        assert_eq!(Page::new(Some(3), Some(20)).offset(), 40);
    }

    #[test]
    fn filter_matches_status_category_and_search() {
        let mut processed = record("Metro-Closure.pdf");
        processed.mark_processed(summary("Station closes in May.", &["Operations"], "80"));
        let pending = record("budget.xlsx");

        let by_status = DocumentFilter::new(Some(DocumentStatus::Processed), None, None);
        assert!(by_status.matches(&processed));
        assert!(!by_status.matches(&pending));

        let by_category = DocumentFilter::new(None, Some("operations".into()), None);
        assert!(by_category.matches(&processed));
        assert!(!by_category.matches(&pending));

        let by_name = DocumentFilter::new(None, None, Some("metro".into()));
        assert!(by_name.matches(&processed));
        let by_summary = DocumentFilter::new(None, None, Some("CLOSES IN".into()));
        assert!(by_summary.matches(&processed));
        assert!(!by_summary.matches(&pending));

        let blank = DocumentFilter::new(None, Some("  ".into()), Some(String::new()));
        assert_eq!(blank, DocumentFilter::default());
        assert!(blank.matches(&pending));
    }

    #[test]
    fn records_serialize_timestamps_as_rfc3339() {
        let mut record = record("notes.txt");
        record.mark_failed("Text extraction failed");
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["status"], "failed");
        assert_eq!(value["format"], "plain-text");
        let uploaded = value["uploaded_at"].as_str().expect("timestamp");
        assert!(uploaded.contains('T'));
        assert!(value["processed_at"].is_string());
    }

    #[test]
    fn statuses_parse_case_insensitively() {
        assert_eq!(
            "Processed".parse::<DocumentStatus>(),
            Ok(DocumentStatus::Processed)
        );
        assert!("archived".parse::<DocumentStatus>().is_err());
    }
}
