use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    DocumentFilter, DocumentPage, DocumentRecord, DocumentRepository, Page, RepositoryError,
};

/// Process-local repository. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryDocumentRepository {
    records: RwLock<HashMap<Uuid, DocumentRecord>>,
}

impl InMemoryDocumentRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn create(&self, record: DocumentRecord) -> Result<DocumentRecord, RepositoryError> {
        let mut guard = self.records.write().await;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Duplicate(record.id));
        }
        guard.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find(&self, id: Uuid) -> Result<Option<DocumentRecord>, RepositoryError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list(
        &self,
        filter: &DocumentFilter,
        page: Page,
    ) -> Result<DocumentPage, RepositoryError> {
        let guard = self.records.read().await;
        let mut matching: Vec<&DocumentRecord> =
            guard.values().filter(|record| filter.matches(record)).collect();
        matching.sort_by(|left, right| {
            right
                .uploaded_at
                .cmp(&left.uploaded_at)
                .then_with(|| left.id.cmp(&right.id))
        });

        let total = matching.len();
        let documents = matching
            .into_iter()
            .skip(page.offset())
            .take(page.limit)
            .cloned()
            .collect();

        Ok(DocumentPage {
            documents,
            total,
            page: page.number,
            limit: page.limit,
        })
    }

    async fn update(&self, record: DocumentRecord) -> Result<DocumentRecord, RepositoryError> {
        let mut guard = self.records.write().await;
        match guard.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(record)
            }
            None => Err(RepositoryError::Missing(record.id)),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<Option<DocumentRecord>, RepositoryError> {
        Ok(self.records.write().await.remove(&id))
    }

    async fn all(&self) -> Result<Vec<DocumentRecord>, RepositoryError> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::fixtures::{record, summary};
    use crate::catalogue::DocumentStatus;
    use time::Duration;

    async fn seeded(count: usize) -> (InMemoryDocumentRepository, Vec<DocumentRecord>) {
        let repository = InMemoryDocumentRepository::new();
        let mut created = Vec::new();
        for index in 0..count {
            let mut record = record(&format!("doc-{index}.txt"));
            record.uploaded_at += Duration::seconds(index as i64);
            created.push(repository.create(record).await.expect("create"));
        }
        (repository, created)
    }

    #[tokio::test]
    async fn create_rejects_duplicate_ids() {
        let repository = InMemoryDocumentRepository::new();
        let record = record("a.txt");
        repository.create(record.clone()).await.expect("first insert");
        let error = repository.create(record).await.expect_err("duplicate");
        assert!(matches!(error, RepositoryError::Duplicate(_)));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_paginated() {
        let (repository, created) = seeded(5).await;

        let first = repository
            .list(&DocumentFilter::default(), Page::new(Some(1), Some(2)))
            .await
            .expect("page one");
        assert_eq!(first.total, 5);
        assert_eq!(first.documents.len(), 2);
        assert_eq!(first.documents[0].id, created[4].id);
        assert_eq!(first.documents[1].id, created[3].id);

        let last = repository
            .list(&DocumentFilter::default(), Page::new(Some(3), Some(2)))
            .await
            .expect("page three");
        assert_eq!(last.documents.len(), 1);
        assert_eq!(last.documents[0].id, created[0].id);
        assert_eq!(last.page, 3);
    }

    #[tokio::test]
    async fn list_applies_filters_before_counting() {
        let (repository, mut created) = seeded(3).await;
        created[1].mark_processed(summary("Fare change", &["finance"], "70"));
        repository.update(created[1].clone()).await.expect("update");

        let filter = DocumentFilter::new(Some(DocumentStatus::Processed), None, None);
        let page = repository
            .list(&filter, Page::default())
            .await
            .expect("filtered");
        assert_eq!(page.total, 1);
        assert_eq!(page.documents[0].id, created[1].id);
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_records() {
        let repository = InMemoryDocumentRepository::new();
        let orphan = record("ghost.txt");
        let error = repository.update(orphan.clone()).await.expect_err("missing");
        assert!(matches!(error, RepositoryError::Missing(id) if id == orphan.id));
        assert!(repository.delete(orphan.id).await.expect("delete").is_none());

        repository.create(orphan.clone()).await.expect("create");
        let removed = repository.delete(orphan.id).await.expect("delete");
        assert_eq!(removed.map(|record| record.id), Some(orphan.id));
        assert!(repository.find(orphan.id).await.expect("find").is_none());
    }
}
