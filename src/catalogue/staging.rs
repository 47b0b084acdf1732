//! On-disk staging of uploaded originals.

use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const MAX_NAME_CHARS: usize = 120;

/// Writes originals under one upload directory as `{id}-{sanitized name}`.
#[derive(Debug, Clone)]
pub struct UploadStaging {
    dir: PathBuf,
}

impl UploadStaging {
    /// Stage files under `dir`; the directory is created on first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Upload directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `bytes` and return the stored path.
    pub async fn stage(&self, id: Uuid, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self
            .dir
            .join(format!("{id}-{}", sanitize_file_name(filename)));
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Staged upload");
        Ok(path)
    }

    /// Delete a staged file. Missing files are not an error.
    pub async fn remove(&self, path: &Path) -> io::Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Staged file already gone");
                Ok(())
            }
            Err(error) => Err(error),
        }
    }
}

/// Reduce `filename` to a safe single path component.
///
/// Directory parts are dropped and anything outside `[A-Za-z0-9._-]` becomes `_`.
pub fn sanitize_file_name(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .take(MAX_NAME_CHARS)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_flattened_and_cleaned() {
        assert_eq!(sanitize_file_name("report 2025.pdf"), "report_2025.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\ana\\memo.docx"), "memo.docx");
        assert_eq!(sanitize_file_name(".."), "upload");
        assert_eq!(sanitize_file_name(""), "upload");
        assert_eq!(sanitize_file_name("estación.txt"), "estaci_n.txt");
    }

    #[tokio::test]
    async fn stage_then_remove_round_trips_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let staging = UploadStaging::new(dir.path().join("uploads"));
        let id = Uuid::new_v4();

        let path = staging
            .stage(id, "notes.txt", b"hello")
            .await
            .expect("stage");
        assert!(path.starts_with(staging.dir()));
        assert!(
            path.file_name()
                .and_then(|name| name.to_str())
                .expect("file name")
                .starts_with(&id.to_string())
        );
        assert_eq!(tokio::fs::read(&path).await.expect("read"), b"hello");

        staging.remove(&path).await.expect("remove");
        assert!(!path.exists());
        staging.remove(&path).await.expect("second remove is a no-op");
    }
}
