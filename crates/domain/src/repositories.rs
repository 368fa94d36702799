//! 持久化抽象
//!
//! 记录以带 `id` 字段的JSON文档形式按集合写入。

use async_trait::async_trait;
use relay_errors::RelayResult;

#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn save(&self, collection: &str, record: &serde_json::Value) -> RelayResult<()>;

    /// 按字段精确匹配，结果按写入时间升序，最多 limit 条
    async fn find_by(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        limit: usize,
    ) -> RelayResult<Vec<serde_json::Value>>;

    /// 存储是否可用，供健康检查使用
    async fn health_check(&self) -> RelayResult<()> {
        Ok(())
    }
}
