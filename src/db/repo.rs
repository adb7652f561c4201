//! Snapshot persistence for the entity store and processing watermark.

use crate::domain::EventOrderingKey;
use crate::store::{EntityStore, MemoryStore};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::info;

const INDEXER_CHECKPOINT: &str = "indexer";

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Replace the stored snapshot with `store` and record `watermark`, in
    /// one transaction.
    ///
    /// # Errors
    /// Returns an error if the transaction fails; the previous snapshot is kept.
    pub async fn persist_snapshot(
        &self,
        store: &MemoryStore,
        watermark: Option<&EventOrderingKey>,
    ) -> Result<usize, sqlx::Error> {
        let updated_at = chrono::Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM entities").execute(&mut *tx).await?;

        let mut written = 0usize;
        for (table, id, value) in store.rows() {
            let body = serde_json::to_string(value).map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
            sqlx::query(
                r#"
                INSERT INTO entities (table_name, id, body, updated_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(table)
            .bind(id)
            .bind(body)
            .bind(updated_at)
            .execute(&mut *tx)
            .await?;
            written += 1;
        }

        if let Some(key) = watermark {
            sqlx::query(
                r#"
                INSERT INTO checkpoints (
                    name, block_number, transaction_index, origin_rank, log_index, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(name) DO UPDATE SET
                    block_number = excluded.block_number,
                    transaction_index = excluded.transaction_index,
                    origin_rank = excluded.origin_rank,
                    log_index = excluded.log_index,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(INDEXER_CHECKPOINT)
            .bind(key.block_number as i64)
            .bind(key.transaction_index as i64)
            .bind(key.origin_rank as i64)
            .bind(key.log_index as i64)
            .bind(updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Persisted {} entities", written);
        Ok(written)
    }

    /// Load the stored snapshot and watermark. An empty database yields an
    /// empty store and no watermark.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored body is not valid JSON.
    pub async fn load_snapshot(
        &self,
    ) -> Result<(MemoryStore, Option<EventOrderingKey>), sqlx::Error> {
        let rows = sqlx::query("SELECT table_name, id, body FROM entities ORDER BY table_name, id")
            .fetch_all(&self.pool)
            .await?;

        let mut store = MemoryStore::new();
        for row in rows {
            let table: String = row.get("table_name");
            let id: String = row.get("id");
            let body: String = row.get("body");
            let value: serde_json::Value =
                serde_json::from_str(&body).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
            store
                .put_raw(&table, &id, value)
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        }

        let watermark = sqlx::query(
            r#"
            SELECT block_number, transaction_index, origin_rank, log_index
            FROM checkpoints WHERE name = ?
            "#,
        )
        .bind(INDEXER_CHECKPOINT)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| EventOrderingKey {
            block_number: row.get::<i64, _>("block_number") as u64,
            transaction_index: row.get::<i64, _>("transaction_index") as u64,
            origin_rank: row.get::<i64, _>("origin_rank") as u8,
            log_index: row.get::<i64, _>("log_index") as u64,
        });

        info!("Loaded {} entities from snapshot", store.len());
        Ok((store, watermark))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    async fn setup_repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    #[tokio::test]
    async fn test_empty_database_loads_empty() {
        let (repo, _dir) = setup_repo().await;
        let (store, watermark) = repo.load_snapshot().await.unwrap();
        assert!(store.is_empty());
        assert_eq!(watermark, None);
    }

    #[tokio::test]
    async fn test_snapshot_replaces_previous() {
        let (repo, _dir) = setup_repo().await;
        let mut store = MemoryStore::new();
        store.put_raw("t", "a", serde_json::json!({"x": 1})).unwrap();
        store.put_raw("t", "b", serde_json::json!({"x": 2})).unwrap();
        repo.persist_snapshot(&store, None).await.unwrap();

        store.delete_raw("t", "a").unwrap();
        let key = EventOrderingKey {
            block_number: 7,
            transaction_index: 1,
            origin_rank: 1,
            log_index: 3,
        };
        assert_eq!(repo.persist_snapshot(&store, Some(&key)).await.unwrap(), 1);

        let (loaded, watermark) = repo.load_snapshot().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get_raw("t", "b").unwrap(), Some(serde_json::json!({"x": 2})));
        assert_eq!(watermark, Some(key));
    }
}
