use async_trait::async_trait;
use chrono::Utc;
use devmap_core::config::StorageKey;
use sqlx::Row;

use crate::repository::{DocumentRepository, StorageError};

use super::SqliteRepository;

#[async_trait]
impl DocumentRepository for SqliteRepository {
    async fn load_raw(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT body
            FROM documents
            WHERE storage_key = ?1
            ",
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let body: String = row
            .try_get("body")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        Ok(Some(body))
    }

    async fn save_raw(&self, key: StorageKey, body: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO documents (storage_key, body, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(storage_key) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key.as_str())
        .bind(body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
