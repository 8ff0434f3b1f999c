// ==========================================
// 测试用例导入 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 流程: 解析 → 映射 → 修复/校验 → 查重 → 落库 → 历史/回滚
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 解析与导入管道
pub mod importer;

// 导入历史 - 会话记录与回滚
pub mod history;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 命令行调用的门面
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    Category, Environment, FileFormat, ImportStage, MatchType, Priority, ResolutionStrategy,
    SessionStatus, Severity, TestStatus,
};

// 领域实体
pub use domain::{
    CandidateRecord, CanonicalField, ContainerStats, DuplicateGroup, DuplicateReport,
    ImportResult, ImportSession, ProgressEvent, TestCase, TestCaseDraft, ValidationIssue,
    ValidationResult,
};

// 导入管道
pub use importer::{ImportError, ProgressReporter, TestCaseImporter, TestCaseImporterImpl};

// 历史与回滚
pub use history::{HistoryStore, RollbackError, RollbackManager};

// 配置
pub use config::{ImportConfig, ImportOptions};

// API
pub use api::{ApiError, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 名称
pub const APP_NAME: &str = "case-import";
