// ==========================================
// 测试用例导入 - 领域类型定义
// ==========================================
// 职责: 测试用例枚举域 + 导入管道状态枚举
// 序列化格式: snake_case (与数据库/导出文件一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 执行状态 (Test Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    NotRun,  // 未执行（默认）
    Pass,    // 通过
    Fail,    // 失败
    Blocked, // 阻塞
    Skipped, // 跳过
}

impl TestStatus {
    pub const ALL: [TestStatus; 5] = [
        TestStatus::NotRun,
        TestStatus::Pass,
        TestStatus::Fail,
        TestStatus::Blocked,
        TestStatus::Skipped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::NotRun => "not_run",
            TestStatus::Pass => "pass",
            TestStatus::Fail => "fail",
            TestStatus::Blocked => "blocked",
            TestStatus::Skipped => "skipped",
        }
    }

    /// 仅接受规范写法（同义词归一由 AutoFixer 负责）
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl Default for TestStatus {
    fn default() -> Self {
        TestStatus::NotRun
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 优先级 (Priority)
// ==========================================
// 顺序: Low < Medium < High < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 用例类别 (Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Functional,
    Regression,
    Smoke,
    Integration,
    Performance,
    Security,
    Usability,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Functional,
        Category::Regression,
        Category::Smoke,
        Category::Integration,
        Category::Performance,
        Category::Security,
        Category::Usability,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Functional => "functional",
            Category::Regression => "regression",
            Category::Smoke => "smoke",
            Category::Integration => "integration",
            Category::Performance => "performance",
            Category::Security => "security",
            Category::Usability => "usability",
            Category::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Functional
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 执行环境 (Environment)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Testing,
    Staging,
    Production,
}

impl Environment {
    pub const ALL: [Environment; 4] = [
        Environment::Development,
        Environment::Testing,
        Environment::Staging,
        Environment::Production,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == value)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Testing
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 校验问题级别 (Severity)
// ==========================================
// 顺序: Info < Warning < Error
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,    // 提示
    Warning, // 数据质量警告（不阻断）
    Error,   // 必填缺失 / 枚举越界（严格模式下阻断）
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

// ==========================================
// 文件格式 (File Format)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    Delimited,   // 分隔符文本（CSV/TSV/...）
    Structured,  // JSON 对象或对象数组
    Spreadsheet, // Excel/ODS（仅第一个工作表）
}

impl FileFormat {
    /// 按扩展名判断格式（未知扩展名返回 None，交由内容嗅探）
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "tsv" | "txt" => Some(FileFormat::Delimited),
            "json" => Some(FileFormat::Structured),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(FileFormat::Spreadsheet),
            _ => None,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Delimited => write!(f, "delimited"),
            FileFormat::Structured => write!(f, "structured"),
            FileFormat::Spreadsheet => write!(f, "spreadsheet"),
        }
    }
}

// ==========================================
// 导入阶段 (Import Stage)
// ==========================================
// 线性状态机: reading → parsing → validating → detecting_duplicates
//            → processing → saving → complete；任一阶段可进入 failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStage {
    Reading,
    Parsing,
    Validating,
    DetectingDuplicates,
    Processing,
    Saving,
    Complete,
    Failed,
}

impl ImportStage {
    /// 阶段固定进度检查点（百分比）
    pub fn checkpoint(&self) -> u8 {
        match self {
            ImportStage::Reading => 0,
            ImportStage::Parsing => 10,
            ImportStage::Validating => 30,
            ImportStage::DetectingDuplicates => 50,
            ImportStage::Processing => 70,
            ImportStage::Saving => 90,
            ImportStage::Complete | ImportStage::Failed => 100,
        }
    }
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ImportStage::Reading => "reading",
            ImportStage::Parsing => "parsing",
            ImportStage::Validating => "validating",
            ImportStage::DetectingDuplicates => "detecting_duplicates",
            ImportStage::Processing => "processing",
            ImportStage::Saving => "saving",
            ImportStage::Complete => "complete",
            ImportStage::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

// ==========================================
// 导入会话状态 (Session Status)
// ==========================================
// 状态迁移: completed/partial → rolled_back；failed 与 rolled_back 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Completed,
    Partial,
    Failed,
    RolledBack,
}

impl SessionStatus {
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::Completed, SessionStatus::RolledBack)
                | (SessionStatus::Partial, SessionStatus::RolledBack)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Failed | SessionStatus::RolledBack)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Partial => write!(f, "partial"),
            SessionStatus::Failed => write!(f, "failed"),
            SessionStatus::RolledBack => write!(f, "rolled_back"),
        }
    }
}

// ==========================================
// 查重匹配类型 (Match Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact, // 聚合相似度 == 1.0
    Fuzzy,
}

// ==========================================
// 重复组处理策略 (Resolution Strategy)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    KeepFirst,   // 保留原始记录
    KeepLast,    // 保留组内最后一条
    MergeFields, // 合并非空字段（原始记录优先）
    SkipAll,     // 整组跳过
}

impl ResolutionStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keep_first" => Some(ResolutionStrategy::KeepFirst),
            "keep_last" => Some(ResolutionStrategy::KeepLast),
            "merge_fields" => Some(ResolutionStrategy::MergeFields),
            "skip_all" => Some(ResolutionStrategy::SkipAll),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_parse_canonical_only() {
        assert_eq!(TestStatus::parse("pass"), Some(TestStatus::Pass));
        assert_eq!(TestStatus::parse("Pass"), None);
        assert_eq!(Priority::parse("critical"), Some(Priority::Critical));
        assert_eq!(Category::parse("smoke"), Some(Category::Smoke));
        assert_eq!(Environment::parse("prod"), None);
    }

    #[test]
    fn test_session_status_transitions() {
        assert!(SessionStatus::Completed.can_transition_to(SessionStatus::RolledBack));
        assert!(SessionStatus::Partial.can_transition_to(SessionStatus::RolledBack));
        assert!(!SessionStatus::Failed.can_transition_to(SessionStatus::RolledBack));
        assert!(!SessionStatus::RolledBack.can_transition_to(SessionStatus::RolledBack));
        assert!(SessionStatus::RolledBack.is_terminal());
    }

    #[test]
    fn test_stage_checkpoints_monotonic() {
        let stages = [
            ImportStage::Reading,
            ImportStage::Parsing,
            ImportStage::Validating,
            ImportStage::DetectingDuplicates,
            ImportStage::Processing,
            ImportStage::Saving,
            ImportStage::Complete,
        ];
        for pair in stages.windows(2) {
            assert!(pair[0].checkpoint() <= pair[1].checkpoint());
        }
    }

    #[test]
    fn test_file_format_from_extension() {
        assert_eq!(FileFormat::from_extension("CSV"), Some(FileFormat::Delimited));
        assert_eq!(FileFormat::from_extension("json"), Some(FileFormat::Structured));
        assert_eq!(FileFormat::from_extension("xlsx"), Some(FileFormat::Spreadsheet));
        assert_eq!(FileFormat::from_extension("pdf"), None);
    }
}
