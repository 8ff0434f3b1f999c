// ==========================================
// 测试用例导入 - 导入历史仓储 Trait
// ==========================================
// 职责: 导入会话的持久化接口（不包含容量/排序规则）
// ==========================================

use crate::domain::import::ImportSession;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ImportHistoryRepository Trait
// ==========================================
// 实现者: SqliteHistoryRepository
#[async_trait]
pub trait ImportHistoryRepository: Send + Sync {
    /// 读取全部会话（按创建时间倒序）
    async fn load_all(&self) -> RepositoryResult<Vec<ImportSession>>;

    /// 插入或覆盖一条会话
    async fn upsert(&self, session: &ImportSession) -> RepositoryResult<()>;

    /// 删除会话
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 不存在
    async fn delete(&self, session_id: &str) -> RepositoryResult<bool>;

    async fn clear(&self) -> RepositoryResult<usize>;
}
