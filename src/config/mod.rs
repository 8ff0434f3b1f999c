// ==========================================
// 测试用例导入 - 配置层
// ==========================================
// 职责: 导入管道常量（config_kv 可覆写）+ 单次导入选项
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;
pub mod import_options;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::{ImportConfig, ImportConfigReader};
pub use import_options::{DuplicateOptions, ImportOptions};
