use crate::datamodel::notifier_datetime;
use crate::storage::{NotifiedStore, StorageError};
use async_trait::async_trait;
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

// SQLite implementation
#[derive(Debug, Clone)]
pub struct SqliteNotifiedStore {
    pool: SqlitePool,
}

impl SqliteNotifiedStore {
    pub async fn connect(connection_string: &str) -> Result<Self, StorageError> {
        let connect_options = SqliteConnectOptions::from_str(connection_string)?
            // Create the database file if it doesn't exist
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            // Set a busy timeout of 5 seconds
            .busy_timeout(Duration::from_secs(5));

        let pool = sqlx::SqlitePool::connect_with(connect_options).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl NotifiedStore for SqliteNotifiedStore {
    async fn create_or_migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("src/storage/sqlite/migrations")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    async fn load_notified_keys(&self) -> Result<HashSet<String>, StorageError> {
        let keys: Vec<String> = sqlx::query_scalar("SELECT offer_key FROM notified_offers")
            .fetch_all(&self.pool)
            .await?;
        Ok(keys.into_iter().collect())
    }

    async fn append_notified_keys(&self, keys: &HashSet<String>) -> Result<(), StorageError> {
        let notified_at = notifier_datetime::now().to_unix_seconds() as i64;
        let mut transaction = self.pool.begin().await?;

        // Existing rows keep their original notification time
        for key in keys {
            sqlx::query(
                "INSERT INTO notified_offers (offer_key, notified_at) VALUES (?, ?) \
                 ON CONFLICT (offer_key) DO NOTHING",
            )
            .bind(key)
            .bind(notified_at)
            .execute(&mut *transaction)
            .await?;
        }

        transaction.commit().await?;
        debug!(keys = keys.len(), "Appended notified keys to SQLite");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
