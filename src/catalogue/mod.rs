//! Catalogue of uploaded documents and their summaries.
//!
//! Storage sits behind [`DocumentRepository`] so the service never touches shared state
//! directly; [`InMemoryDocumentRepository`] is the implementation shipped with the server.

mod memory;
pub mod staging;
mod stats;
mod types;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use memory::InMemoryDocumentRepository;
pub use staging::UploadStaging;
pub use stats::{UsageStats, compute_usage_stats};
pub use types::{DocumentFilter, DocumentPage, DocumentRecord, DocumentStatus, Page};

#[cfg(test)]
pub(crate) use types::fixtures;

/// Errors raised by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A record with the same id already exists.
    #[error("Document {0} already exists")]
    Duplicate(Uuid),
    /// The record to update does not exist.
    #[error("Document {0} not found")]
    Missing(Uuid),
    /// The backing store failed.
    #[error("Document store unavailable: {0}")]
    Unavailable(String),
}

/// Storage for document records.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert a new record.
    async fn create(&self, record: DocumentRecord) -> Result<DocumentRecord, RepositoryError>;

    /// Fetch one record.
    async fn find(&self, id: Uuid) -> Result<Option<DocumentRecord>, RepositoryError>;

    /// Records matching `filter`, newest first, one page at a time.
    async fn list(
        &self,
        filter: &DocumentFilter,
        page: Page,
    ) -> Result<DocumentPage, RepositoryError>;

    /// Replace an existing record.
    async fn update(&self, record: DocumentRecord) -> Result<DocumentRecord, RepositoryError>;

    /// Remove a record, returning it when it existed.
    async fn delete(&self, id: Uuid) -> Result<Option<DocumentRecord>, RepositoryError>;

    /// Every record, in no particular order.
    async fn all(&self) -> Result<Vec<DocumentRecord>, RepositoryError>;
}
