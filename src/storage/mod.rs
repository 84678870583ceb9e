pub mod error;
pub mod json_file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod storage;
pub mod storage_factory;

pub use error::StorageError;
pub use storage::NotifiedStore;
