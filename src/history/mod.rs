// ==========================================
// 测试用例导入 - 导入历史层
// ==========================================
// 职责: 导入会话的记录、查询、导出，以及按会话回滚
// ==========================================

pub mod history_store;
pub mod rollback;

pub use history_store::HistoryStore;
pub use rollback::{RollbackError, RollbackManager, RollbackOutcome};
