// ==========================================
// 测试用例导入 - 测试用例存储 Trait
// ==========================================
// 职责: 定义记录存储协作方接口（不包含实现）
// 红线: 导入管道只通过这些注入的操作访问存储，不直接管理连接
// ==========================================

use crate::domain::test_case::{ContainerStats, TestCase, TestCaseDraft};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// TestCaseStore Trait
// ==========================================
// 实现者: SqliteTestCaseStore
#[async_trait]
pub trait TestCaseStore: Send + Sync {
    /// 创建一条测试用例
    ///
    /// # 返回
    /// - Ok(TestCase): 已落库的记录（ID 与创建时间以存储为准）
    async fn create(&self, draft: TestCaseDraft) -> RepositoryResult<TestCase>;

    /// 批量创建（默认逐条调用 create）
    ///
    /// # 返回
    /// - Ok(Vec<TestCase>): 与输入顺序一致
    async fn create_many(&self, drafts: Vec<TestCaseDraft>) -> RepositoryResult<Vec<TestCase>> {
        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            created.push(self.create(draft).await?);
        }
        Ok(created)
    }

    /// 按 ID 批量删除
    ///
    /// # 返回
    /// - Ok(usize): 实际删除条数
    async fn delete_many(&self, ids: &[String]) -> RepositoryResult<usize>;

    async fn get_by_id(&self, id: &str) -> RepositoryResult<Option<TestCase>>;

    /// 项目下的用例总数
    async fn count_by_project(&self, project_id: &str) -> RepositoryResult<usize>;
}

// ==========================================
// StatsStore Trait
// ==========================================
// 用途: 容器聚合统计（导入前快照 / 回滚时恢复）
// 实现者: SqliteTestCaseStore
#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn get_stats(&self, container_id: &str) -> RepositoryResult<Option<ContainerStats>>;

    /// 导入后累加统计
    async fn apply_import(&self, container_id: &str, imported: usize) -> RepositoryResult<ContainerStats>;

    /// 以快照覆盖统计
    async fn restore_stats(&self, stats: &ContainerStats) -> RepositoryResult<()>;
}
