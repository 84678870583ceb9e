use thiserror::Error;

/// Errors raised while loading or persisting the notified set.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection or query execution error
    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(feature = "sqlite")]
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("File error on {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid data format in {path}: {source}")]
    InvalidDataFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage operation failed: {operation} - {details}")]
    OperationFailed { operation: String, details: String },
}

impl StorageError {
    pub fn file(path: &std::path::Path, source: std::io::Error) -> Self {
        StorageError::File {
            path: path.display().to_string(),
            source,
        }
    }
}
