use super::{NotifiedStore, StorageError};
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::Mutex;

/// Keeps the notified keys for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemoryNotifiedStore {
    keys: Mutex<HashSet<String>>,
}

impl MemoryNotifiedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys<I: IntoIterator<Item = String>>(keys: I) -> Self {
        Self {
            keys: Mutex::new(keys.into_iter().collect()),
        }
    }
}

#[async_trait]
impl NotifiedStore for MemoryNotifiedStore {
    async fn create_or_migrate(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn load_notified_keys(&self) -> Result<HashSet<String>, StorageError> {
        Ok(self.keys.lock().await.clone())
    }

    async fn append_notified_keys(&self, keys: &HashSet<String>) -> Result<(), StorageError> {
        self.keys.lock().await.extend(keys.iter().cloned());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
