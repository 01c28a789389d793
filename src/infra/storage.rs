//! Document storage.
//!
//! Uploaded registration documents are kept on local disk below the
//! configured media root, addressed by a relative storage key.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    async fn save(&self, key: &str, bytes: Vec<u8>) -> AppResult<()>;

    async fn load(&self, key: &str) -> AppResult<Vec<u8>>;

    async fn remove(&self, key: &str) -> AppResult<()>;
}

/// Filesystem storage rooted at the media directory
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a key below the root, refusing anything that could escape it.
    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(AppError::BadRequest(format!("invalid storage key {}", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DocumentStorage for LocalStorage {
    async fn save(&self, key: &str, bytes: Vec<u8>) -> AppResult<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), "Document stored");
        Ok(())
    }

    async fn load(&self, key: &str) -> AppResult<Vec<u8>> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let key = "registration_documents/req/doc.pdf";

        storage.save(key, b"%PDF-1.4".to_vec()).await.unwrap();
        assert!(dir.path().join(key).exists());
        assert_eq!(storage.load(key).await.unwrap(), b"%PDF-1.4".to_vec());

        storage.remove(key).await.unwrap();
        assert!(matches!(storage.load(key).await, Err(AppError::NotFound)));
        // removing twice is fine
        storage.remove(key).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_keys_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        for key in ["../secret", "/etc/passwd", "a/../../b", ""] {
            assert!(
                matches!(storage.save(key, vec![1]).await, Err(AppError::BadRequest(_))),
                "key {:?} should be refused",
                key
            );
        }
    }
}
