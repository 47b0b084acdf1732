//! Document service coordinating staging, summarization, and the catalogue.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::catalogue::{
    DocumentFilter, DocumentPage, DocumentRecord, DocumentRepository, DocumentStatus,
    InMemoryDocumentRepository, Page, RepositoryError, UploadStaging, UsageStats,
    compute_usage_stats,
};
use crate::config::Config;
use crate::extraction::{ExtractionError, FormatTag};
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::summarization::{DocumentSummary, SummaryAssembler, assembler_from_config};

/// MIME types that say nothing about the content; the file extension decides instead.
const GENERIC_MIME_TYPES: [&str; 2] = ["application/octet-stream", "binary/octet-stream"];

/// Caller-safe message stored on records whose extraction failed.
pub const EXTRACTION_FAILED_MESSAGE: &str = "Text extraction failed";

/// Errors emitted by the document service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Neither the MIME type nor the file name identify a supported format.
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),
    /// Upload exceeds the configured size limit.
    #[error("Document is {size} bytes; the limit is {limit} bytes")]
    TooLarge {
        /// Upload size in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },
    /// The document could not be read as its declared format.
    #[error("Text extraction failed: {0}")]
    Extraction(#[source] ExtractionError),
    /// Staging or the repository failed.
    #[error("Document storage failed: {0}")]
    Storage(String),
    /// No document has the requested id.
    #[error("Document {0} not found")]
    NotFound(Uuid),
}

impl From<RepositoryError> for ServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Missing(id) => Self::NotFound(id),
            other => Self::Storage(other.to_string()),
        }
    }
}

/// An uploaded file as received from a client.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied file name.
    pub filename: String,
    /// Client-declared MIME type, if any.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Operations exposed to the HTTP surface.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Summarize raw text without cataloguing it.
    async fn summarize_text(&self, text: &str) -> DocumentSummary;

    /// Stage, summarize, and catalogue an upload.
    async fn ingest(&self, upload: Upload) -> Result<DocumentRecord, ServiceError>;

    /// Fetch one catalogued document.
    async fn get_document(&self, id: Uuid) -> Result<DocumentRecord, ServiceError>;

    /// List catalogued documents, newest first.
    async fn list_documents(
        &self,
        filter: DocumentFilter,
        page: Page,
    ) -> Result<DocumentPage, ServiceError>;

    /// Remove a document and its staged original.
    async fn delete_document(&self, id: Uuid) -> Result<(), ServiceError>;

    /// Aggregate catalogue statistics.
    async fn usage_stats(&self) -> Result<UsageStats, ServiceError>;

    /// Pipeline counters.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Production implementation of [`DocumentApi`].
///
/// Construct once at startup and share through an `Arc`.
pub struct DocumentService {
    assembler: SummaryAssembler,
    repository: Arc<dyn DocumentRepository>,
    staging: UploadStaging,
    max_upload_bytes: usize,
}

impl DocumentService {
    /// Create a service from its collaborators.
    pub fn new(
        assembler: SummaryAssembler,
        repository: Arc<dyn DocumentRepository>,
        staging: UploadStaging,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            assembler,
            repository,
            staging,
            max_upload_bytes,
        }
    }

    /// Wire the service from configuration with an in-memory catalogue.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let assembler = assembler_from_config(config, Arc::new(PipelineMetrics::new()))?;
        tracing::info!(
            upload_dir = %config.upload_dir.display(),
            max_upload_bytes = config.max_upload_bytes,
            "Document service initialized"
        );
        Ok(Self::new(
            assembler,
            Arc::new(InMemoryDocumentRepository::new()),
            UploadStaging::new(config.upload_dir.clone()),
            config.max_upload_bytes,
        ))
    }

    async fn finish_failed(
        &self,
        mut record: DocumentRecord,
        error: ExtractionError,
    ) -> ServiceError {
        tracing::error!(
            id = %record.id,
            format = %record.format,
            error = %error,
            "Document processing failed"
        );
        record.mark_failed(EXTRACTION_FAILED_MESSAGE);
        if let Err(update_error) = self.repository.update(record).await {
            tracing::error!(error = %update_error, "Failed to record document failure");
        }
        ServiceError::Extraction(error)
    }
}

/// Resolve the format of an upload from its MIME type, or its extension when the MIME type is
/// missing or generic.
pub fn resolve_format(filename: &str, content_type: Option<&str>) -> Result<FormatTag, ServiceError> {
    let declared = content_type
        .map(str::trim)
        .filter(|mime| !mime.is_empty())
        .filter(|mime| {
            !GENERIC_MIME_TYPES
                .iter()
                .any(|generic| mime.eq_ignore_ascii_case(generic))
        });

    let resolved = match declared {
        Some(mime) => FormatTag::from_mime(mime),
        None => FormatTag::from_file_name(filename),
    };
    resolved.map_err(|error| match error {
        ExtractionError::UnsupportedFormat(what) => ServiceError::UnsupportedFormat(what),
        other => ServiceError::UnsupportedFormat(other.to_string()),
    })
}

fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[async_trait]
impl DocumentApi for DocumentService {
    async fn summarize_text(&self, text: &str) -> DocumentSummary {
        self.assembler.summarize_text(text).await
    }

    async fn ingest(&self, upload: Upload) -> Result<DocumentRecord, ServiceError> {
        let Upload {
            filename,
            content_type,
            bytes,
        } = upload;

        let format = resolve_format(&filename, content_type.as_deref())?;
        if bytes.len() > self.max_upload_bytes {
            return Err(ServiceError::TooLarge {
                size: bytes.len(),
                limit: self.max_upload_bytes,
            });
        }

        let id = Uuid::new_v4();
        let stored_path = self
            .staging
            .stage(id, &filename, &bytes)
            .await
            .map_err(|error| ServiceError::Storage(format!("failed to stage upload: {error}")))?;
        let staged_path = stored_path.clone();

        let record = DocumentRecord {
            id,
            filename,
            format,
            size_bytes: bytes.len() as u64,
            checksum: checksum(&bytes),
            stored_path,
            status: DocumentStatus::Processing,
            uploaded_at: OffsetDateTime::now_utc(),
            processed_at: None,
            summary: None,
            error: None,
        };
        let mut record = match self.repository.create(record).await {
            Ok(record) => record,
            Err(error) => {
                tracing::error!(id = %id, error = %error, "Failed to catalogue upload");
                if let Err(cleanup) = self.staging.remove(&staged_path).await {
                    tracing::warn!(id = %id, error = %cleanup, "Failed to remove staged original");
                }
                return Err(error.into());
            }
        };
        tracing::info!(
            id = %record.id,
            filename = %record.filename,
            format = %format,
            size_bytes = record.size_bytes,
            "Document accepted"
        );

        match self.assembler.summarize_file(bytes, format).await {
            Ok(summary) => {
                record.mark_processed(summary);
                let record = self.repository.update(record).await?;
                tracing::info!(id = %record.id, "Document processed");
                Ok(record)
            }
            Err(error) => Err(self.finish_failed(record, error).await),
        }
    }

    async fn get_document(&self, id: Uuid) -> Result<DocumentRecord, ServiceError> {
        self.repository
            .find(id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    async fn list_documents(
        &self,
        filter: DocumentFilter,
        page: Page,
    ) -> Result<DocumentPage, ServiceError> {
        Ok(self.repository.list(&filter, page).await?)
    }

    async fn delete_document(&self, id: Uuid) -> Result<(), ServiceError> {
        let record = self
            .repository
            .delete(id)
            .await?
            .ok_or(ServiceError::NotFound(id))?;
        if let Err(error) = self.staging.remove(&record.stored_path).await {
            tracing::warn!(id = %id, error = %error, "Failed to remove staged original");
        }
        tracing::info!(id = %id, "Document deleted");
        Ok(())
    }

    async fn usage_stats(&self) -> Result<UsageStats, ServiceError> {
        let records = self.repository.all().await?;
        Ok(compute_usage_stats(&records))
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.assembler.metrics().snapshot()
    }
}
