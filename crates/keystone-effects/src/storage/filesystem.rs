//! Filesystem storage handler
//!
//! Each key is one file. A key `grants:abc` lives at `<base>/grants/abc.dat`:
//! colon-separated segments become directories. Writes go through a
//! temporary file and a rename so readers never observe a partial value, and
//! `take` claims a file by renaming it away before reading it, which lets
//! exactly one of several concurrent callers win.

use async_trait::async_trait;
use keystone_core::effects::{StorageCoreEffects, StorageError};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::fs::DirEntry;

const VALUE_EXTENSION: &str = "dat";
const KEY_SEPARATOR: char = ':';

/// Whether `segment` can be one colon-separated part of a storage key.
///
/// Segments become path components, so they must be non-empty, must not be
/// `.` or `..`, and must not contain a path separator.
fn is_valid_key_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains(['/', '\\'])
}

/// Filesystem-based storage handler
#[derive(Debug, Clone)]
pub struct FilesystemStorageHandler {
    /// Base directory for storage files
    base_path: PathBuf,
}

impl FilesystemStorageHandler {
    /// Create a new filesystem storage handler rooted at `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Root directory of the store
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey {
                reason: "Key cannot be empty".to_string(),
            });
        }
        let mut path = self.base_path.clone();
        let mut segments = key.split(KEY_SEPARATOR).peekable();
        while let Some(segment) = segments.next() {
            if !is_valid_key_segment(segment) {
                return Err(StorageError::InvalidKey {
                    reason: format!("Invalid key segment in {key:?}"),
                });
            }
            if segments.peek().is_some() {
                path.push(segment);
            } else {
                path.push(format!("{segment}.{VALUE_EXTENSION}"));
            }
        }
        Ok(path)
    }

    fn sibling_path(path: &Path, tag: &str) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        name.push_str(&format!(".{tag}-{}", uuid::Uuid::new_v4()));
        path.with_file_name(format!(".{name}"))
    }

    async fn visit_entry_for_keys(
        base: &Path,
        entry: DirEntry,
        prefix: Option<&str>,
        stack: &mut Vec<PathBuf>,
        keys: &mut Vec<String>,
    ) -> Result<(), StorageError> {
        let file_type = entry.file_type().await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to stat directory entry: {e}"))
        })?;
        let path = entry.path();

        if file_type.is_dir() {
            stack.push(path);
            return Ok(());
        }
        if !file_type.is_file() {
            return Ok(());
        }
        let rel = path.strip_prefix(base).map_err(|e| {
            StorageError::ReadFailed(format!("Failed to compute relative key path: {e}"))
        })?;
        let mut segments: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        let suffix = format!(".{VALUE_EXTENSION}");
        let Some(last) = segments.pop() else {
            return Ok(());
        };
        let Some(stem) = last.strip_suffix(&suffix) else {
            return Ok(());
        };
        if stem.is_empty() {
            return Ok(());
        }
        segments.push(stem.to_string());
        let key = segments.join(&KEY_SEPARATOR.to_string());

        if prefix.map_or(true, |p| key.starts_with(p)) {
            keys.push(key);
        }
        Ok(())
    }
}

#[async_trait]
impl StorageCoreEffects for FilesystemStorageHandler {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let file_path = self.key_path(key)?;
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::WriteFailed(format!("Failed to create directory: {e}"))
            })?;
        }

        let staging = Self::sibling_path(&file_path, "tmp");
        fs::write(&staging, value)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("Failed to write file: {e}")))?;
        fs::rename(&staging, &file_path)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("Failed to publish file: {e}")))?;
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let file_path = self.key_path(key)?;
        match fs::read(&file_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed(format!("Failed to read file: {e}"))),
        }
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let file_path = self.key_path(key)?;
        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to remove file: {e}"
            ))),
        }
    }

    async fn take(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let file_path = self.key_path(key)?;
        let claimed = Self::sibling_path(&file_path, "taken");

        match fs::rename(&file_path, &claimed).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to claim file: {e}"
                )))
            }
        }

        let data = fs::read(&claimed)
            .await
            .map_err(|e| StorageError::ReadFailed(format!("Failed to read claimed file: {e}")))?;
        if let Err(e) = fs::remove_file(&claimed).await {
            tracing::warn!(error = %e, "failed to remove claimed storage file");
        }
        Ok(Some(data))
    }

    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
        // Keys span nested directories, so walk the tree iteratively.
        let mut keys = Vec::new();
        let mut stack: Vec<PathBuf> = vec![self.base_path.clone()];

        while let Some(dir) = stack.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(e) => e,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(StorageError::ReadFailed(format!(
                        "Failed to read directory: {e}"
                    )))
                }
            };

            while let Some(entry) = entries.next_entry().await.map_err(|e| {
                StorageError::ReadFailed(format!("Failed to read directory entry: {e}"))
            })? {
                Self::visit_entry_for_keys(&self.base_path, entry, prefix, &mut stack, &mut keys)
                    .await?;
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_keys_as_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorageHandler::new(dir.path());

        storage.store("grants:g1", b"one".to_vec()).await.unwrap();
        storage.store("agents:a1", b"two".to_vec()).await.unwrap();

        assert!(dir.path().join("grants").join("g1.dat").exists());
        assert_eq!(
            storage.retrieve("grants:g1").await.unwrap(),
            Some(b"one".to_vec())
        );
        assert_eq!(
            storage.list_keys(Some("grants:")).await.unwrap(),
            vec!["grants:g1".to_string()]
        );
        assert_eq!(storage.list_keys(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn take_is_single_use() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorageHandler::new(dir.path());

        storage.store("challenges:c1", b"c".to_vec()).await.unwrap();
        assert_eq!(
            storage.take("challenges:c1").await.unwrap(),
            Some(b"c".to_vec())
        );
        assert_eq!(storage.take("challenges:c1").await.unwrap(), None);
        assert!(storage.list_keys(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorageHandler::new(dir.path());

        assert!(storage.store("grants:../x", vec![]).await.is_err());
        assert!(storage.store("grants:a/b", vec![]).await.is_err());
        assert!(storage.store("grants::x", vec![]).await.is_err());
    }

    #[tokio::test]
    async fn dotted_keys_stay_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorageHandler::new(dir.path());

        storage.store("agents:bot.v1", b"one".to_vec()).await.unwrap();
        storage.store("agents:bot.v2", b"two".to_vec()).await.unwrap();
        storage.store("agents:bot", b"bare".to_vec()).await.unwrap();

        assert_eq!(
            storage.retrieve("agents:bot.v1").await.unwrap(),
            Some(b"one".to_vec())
        );
        assert_eq!(
            storage.retrieve("agents:bot.v2").await.unwrap(),
            Some(b"two".to_vec())
        );
        assert_eq!(
            storage.list_keys(Some("agents:")).await.unwrap(),
            vec![
                "agents:bot".to_string(),
                "agents:bot.v1".to_string(),
                "agents:bot.v2".to_string()
            ]
        );
        assert_eq!(
            storage.take("agents:bot.v1").await.unwrap(),
            Some(b"one".to_vec())
        );
        assert_eq!(
            storage.retrieve("agents:bot.v2").await.unwrap(),
            Some(b"two".to_vec())
        );
    }

    #[test]
    fn key_segment_rules() {
        assert!(is_valid_key_segment("bot.v1"));
        assert!(!is_valid_key_segment(""));
        assert!(!is_valid_key_segment(".."));
        assert!(!is_valid_key_segment("a/b"));
        assert!(!is_valid_key_segment("a\\b"));
    }

    #[tokio::test]
    async fn missing_keys_read_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorageHandler::new(dir.path().join("never-created"));

        assert_eq!(storage.retrieve("grants:nope").await.unwrap(), None);
        assert!(!storage.remove("grants:nope").await.unwrap());
        assert!(storage.list_keys(None).await.unwrap().is_empty());
    }
}
