use super::StorageError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt::Debug;

/// Local key/value persistence of the notified offer keys.
#[async_trait]
pub trait NotifiedStore: Send + Sync + Debug {
    async fn create_or_migrate(&self) -> Result<(), StorageError>;
    async fn load_notified_keys(&self) -> Result<HashSet<String>, StorageError>;
    /// Adds `keys` to the persisted set. Keys already stored are left as is.
    async fn append_notified_keys(&self, keys: &HashSet<String>) -> Result<(), StorageError>;
    async fn health_check(&self) -> Result<(), StorageError>;
}
