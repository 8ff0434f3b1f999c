// ==========================================
// 测试用例导入 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod history_repo;
pub mod history_repo_impl;
pub mod test_case_repo;
pub mod test_case_repo_impl;

pub use error::{RepositoryError, RepositoryResult};
pub use history_repo::ImportHistoryRepository;
pub use history_repo_impl::SqliteHistoryRepository;
pub use test_case_repo::{StatsStore, TestCaseStore};
pub use test_case_repo_impl::SqliteTestCaseStore;
