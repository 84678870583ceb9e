use super::{NotifiedStore, StorageError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stores the notified keys as a sorted JSON array.
///
/// Writes go to a sibling temporary file that is renamed over the target,
/// so a crash mid-write leaves the previous set intact.
#[derive(Debug, Clone)]
pub struct JsonFileNotifiedStore {
    path: PathBuf,
}

impl JsonFileNotifiedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temporary_path(&self) -> PathBuf {
        let mut file_name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        file_name.push(".tmp");
        self.path.with_file_name(file_name)
    }
}

#[async_trait]
impl NotifiedStore for JsonFileNotifiedStore {
    async fn create_or_migrate(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StorageError::file(parent, e))?;
            }
        }
        Ok(())
    }

    async fn load_notified_keys(&self) -> Result<HashSet<String>, StorageError> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(StorageError::file(&self.path, e)),
        };
        let keys: Vec<String> =
            serde_json::from_slice(&content).map_err(|source| StorageError::InvalidDataFormat {
                path: self.path.display().to_string(),
                source,
            })?;
        Ok(keys.into_iter().collect())
    }

    /// Rewrites the whole file with the union of the stored and new keys.
    async fn append_notified_keys(&self, keys: &HashSet<String>) -> Result<(), StorageError> {
        let mut all_keys = self.load_notified_keys().await?;
        all_keys.extend(keys.iter().cloned());
        let mut sorted: Vec<&String> = all_keys.iter().collect();
        sorted.sort_unstable();
        let content =
            serde_json::to_vec_pretty(&sorted).map_err(|source| StorageError::InvalidDataFormat {
                path: self.path.display().to_string(),
                source,
            })?;

        let temporary = self.temporary_path();
        tokio::fs::write(&temporary, content)
            .await
            .map_err(|e| StorageError::file(&temporary, e))?;
        tokio::fs::rename(&temporary, &self.path)
            .await
            .map_err(|e| StorageError::file(&self.path, e))?;

        debug!(path = %self.path.display(), keys = all_keys.len(), "Saved notified keys");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        match tokio::fs::metadata(&self.path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::file(&self.path, e)),
        }
    }
}
