use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::SecondsFormat;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use relay_domain::PersistenceStore;
use relay_errors::{RelayError, RelayResult};

use super::{record_id, record_timestamp};

/// 以JSON文本保存记录的SQLite存储，所有集合共用一张表
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str, max_connections: u32) -> RelayResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub async fn init(&self) -> RelayResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                payload TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_records_collection ON records (collection, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn count(&self, collection: &str) -> RelayResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM records WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("count")?)
    }
}

#[async_trait]
impl PersistenceStore for SqliteStore {
    async fn save(&self, collection: &str, record: &serde_json::Value) -> RelayResult<()> {
        let id = record_id(record)?;
        let payload = serde_json::to_string(record)
            .map_err(|e| RelayError::Serialization(format!("序列化记录失败: {e}")))?;

        sqlx::query(
            "INSERT INTO records (id, collection, payload, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(collection)
        .bind(payload)
        .bind(record_timestamp(record).to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await?;

        debug!("保存记录成功: {}/{}", collection, id);
        Ok(())
    }

    async fn health_check(&self) -> RelayResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_by(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        limit: usize,
    ) -> RelayResult<Vec<serde_json::Value>> {
        let rows = sqlx::query(
            r#"
            SELECT payload FROM records
            WHERE collection = ? AND json_extract(payload, '$.' || ?) = ?
            ORDER BY created_at ASC, rowid ASC
            LIMIT ?
            "#,
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let payload: String = row.try_get("payload")?;
                serde_json::from_str(&payload).map_err(RelayError::from)
            })
            .collect()
    }
}
