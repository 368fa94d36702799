use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use relay_domain::PersistenceStore;
use relay_errors::{RelayError, RelayResult};

use super::{record_id, record_timestamp};

#[derive(Debug, Clone)]
struct StoredRecord {
    collection: String,
    id: String,
    created_at: DateTime<Utc>,
    payload: serde_json::Value,
}

/// 进程内存储，重启即丢失
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.collection == collection)
            .count()
    }

    pub async fn records(&self, collection: &str) -> Vec<serde_json::Value> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.collection == collection)
            .map(|r| r.payload.clone())
            .collect()
    }
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn save(&self, collection: &str, record: &serde_json::Value) -> RelayResult<()> {
        let id = record_id(record)?.to_string();
        let mut records = self.records.write().await;

        if records.iter().any(|r| r.id == id) {
            return Err(RelayError::persistence_error(format!("记录已存在: {id}")));
        }
        records.push(StoredRecord {
            collection: collection.to_string(),
            id,
            created_at: record_timestamp(record),
            payload: record.clone(),
        });
        Ok(())
    }

    async fn find_by(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        limit: usize,
    ) -> RelayResult<Vec<serde_json::Value>> {
        let records = self.records.read().await;
        let mut matched: Vec<&StoredRecord> = records
            .iter()
            .filter(|r| r.collection == collection)
            .filter(|r| r.payload.get(field).and_then(|v| v.as_str()) == Some(value))
            .collect();
        // 稳定排序，时间相同的保持写入顺序
        matched.sort_by_key(|r| r.created_at);

        Ok(matched
            .into_iter()
            .take(limit)
            .map(|r| r.payload.clone())
            .collect())
    }
}
