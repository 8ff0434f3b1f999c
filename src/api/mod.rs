// ==========================================
// 测试用例导入 - API 层
// ==========================================
// 职责: 装配导入管道并提供业务接口，供命令行调用
// ==========================================

pub mod error;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{get_default_db_path, ImportApi, DB_PATH_ENV};
