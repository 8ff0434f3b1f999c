// ==========================================
// 测试用例导入 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、导入管道中间产物
// 红线: 不含数据访问逻辑,不含管道逻辑
// ==========================================

pub mod import;
pub mod test_case;
pub mod types;

// 重导出核心类型
pub use import::{
    CellValue, DuplicateGroup, DuplicateReport, DuplicateSummary, ImportResult, ImportSession,
    ImportSummary, ParseMeta, ParseOptions, ParseOutput, ProgressEvent, RawRow, RollbackSnapshot,
    SessionSummary, SkippedRow, ValidationIssue, ValidationResult, ValidationSummary,
};
pub use test_case::{CandidateRecord, CanonicalField, ContainerStats, TestCase, TestCaseDraft};
pub use types::{
    Category, Environment, FileFormat, ImportStage, MatchType, Priority, ResolutionStrategy,
    SessionStatus, Severity, TestStatus,
};
