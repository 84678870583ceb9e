use std::sync::Arc;

use super::json_file::JsonFileNotifiedStore;
use super::memory::MemoryNotifiedStore;
use super::{NotifiedStore, StorageError};

#[cfg(feature = "sqlite")]
use super::sqlite::SqliteNotifiedStore;

pub async fn create_store_from_connection_string(
    connection_string: &str,
) -> Result<Arc<dyn NotifiedStore>, StorageError> {
    Ok(match connection_string {
        #[cfg(feature = "sqlite")]
        s if s.starts_with("sqlite:") => Arc::new(SqliteNotifiedStore::connect(s).await?),

        #[cfg(not(feature = "sqlite"))]
        s if s.starts_with("sqlite:") => {
            return Err(StorageError::Configuration(
                "SQLite storage backend is not enabled. Enable with --features sqlite".to_string(),
            ));
        }

        s if s.starts_with("file://") => Arc::new(JsonFileNotifiedStore::new(&s["file://".len()..])),
        s if s.starts_with("file:") => Arc::new(JsonFileNotifiedStore::new(&s["file:".len()..])),

        s if s.starts_with("memory:") => Arc::new(MemoryNotifiedStore::new()),

        _ => {
            return Err(StorageError::Configuration(format!(
                "Unsupported storage type: {}",
                connection_string
            )));
        }
    })
}
