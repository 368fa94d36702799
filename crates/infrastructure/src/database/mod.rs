pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use relay_config::DatabaseConfig;
use relay_domain::PersistenceStore;
use relay_errors::{RelayError, RelayResult};
use tracing::info;

/// 存储后端类型
#[derive(Debug, Clone, PartialEq)]
pub enum StoreType {
    Sqlite,
    Memory,
}

impl StoreType {
    pub fn from_url(url: &str) -> RelayResult<Self> {
        if url.starts_with("memory://") {
            Ok(StoreType::Memory)
        } else if url.starts_with("sqlite:") {
            Ok(StoreType::Sqlite)
        } else {
            Err(RelayError::config_error(format!("不支持的数据库URL: {url}")))
        }
    }
}

/// 启动时显式创建存储并完成初始化
pub async fn create_store(config: &DatabaseConfig) -> RelayResult<Arc<dyn PersistenceStore>> {
    match StoreType::from_url(&config.url)? {
        StoreType::Memory => {
            info!("使用内存存储");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreType::Sqlite => {
            let store = SqliteStore::connect(&config.url, config.max_connections).await?;
            store.init().await?;
            info!(url = %config.url, "SQLite存储已初始化");
            Ok(Arc::new(store))
        }
    }
}

/// 取出记录自带的 id 字段
pub(crate) fn record_id(record: &serde_json::Value) -> RelayResult<&str> {
    record
        .get("id")
        .and_then(|id| id.as_str())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| RelayError::persistence_error("记录缺少id字段"))
}

/// 记录的排序时间：优先使用文档自带的 `created_at`，缺失或无法解析时取当前时间
pub(crate) fn record_timestamp(record: &serde_json::Value) -> DateTime<Utc> {
    record
        .get("created_at")
        .and_then(|value| value.as_str())
        .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|value| value.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}
