// ==========================================
// 测试用例导入 - 导入管道 Trait
// ==========================================
// 职责: 定义各阶段组件接口（不包含实现）
// 流程: 解析 → 映射 → 修复 → 校验 → 查重 → 落库
// ==========================================

use crate::config::{DuplicateOptions, ImportOptions};
use crate::domain::import::{
    DuplicateReport, ImportResult, ParseOptions, ParseOutput, RawRow, ValidationResult,
};
use crate::domain::test_case::CandidateRecord;
use crate::importer::progress::ProgressReporter;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

// ==========================================
// TestCaseImporter Trait
// ==========================================
// 用途: 导入主接口
// 实现者: TestCaseImporterImpl
// 红线: 永不返回 Err，整体失败折叠为 success=false 的 ImportResult
#[async_trait]
pub trait TestCaseImporter: Send + Sync {
    /// 从内存内容导入
    ///
    /// # 参数
    /// - content: 文件原始字节
    /// - options: 导入选项（file_name 用于格式判断与会话记录）
    /// - progress: 进度通道（可为空）
    async fn import_bytes(
        &self,
        content: Vec<u8>,
        options: ImportOptions,
        progress: ProgressReporter,
    ) -> ImportResult;

    /// 从文件路径导入（读取阶段执行大小校验）
    async fn import_file(
        &self,
        file_path: &Path,
        options: ImportOptions,
        progress: ProgressReporter,
    ) -> ImportResult;

    /// 批量导入多个文件（并发执行，互不影响）
    async fn batch_import(
        &self,
        file_paths: Vec<PathBuf>,
        options: ImportOptions,
    ) -> Vec<ImportResult>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析（阶段 parsing）
// 实现者: UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析内容为原始行
    ///
    /// # 返回
    /// - ParseOutput: 致命失败时 rows 为空且 errors 非空
    fn parse(&self, content: &[u8], options: &ParseOptions) -> ParseOutput;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 原始列 → 规范字段（纯函数）
// 实现者: SynonymFieldMapper
pub trait FieldMapper: Send + Sync {
    /// # 参数
    /// - row: 原始行
    /// - row_index: 行号（从 1 开始）
    /// - project_id / suite_id: 目标容器
    fn map(
        &self,
        row: &RawRow,
        row_index: usize,
        project_id: Option<&str>,
        suite_id: Option<&str>,
    ) -> CandidateRecord;
}

// ==========================================
// AutoFixer Trait
// ==========================================
// 用途: 原地修复常见问题，每次修改输出一条审计记录
// 实现者: DataCleaner
pub trait AutoFixer: Send + Sync {
    /// # 返回
    /// - Vec<String>: "Row N: ..." 审计记录（幂等：对已修复数据返回空）
    fn apply_fixes(&self, records: &mut [CandidateRecord], generate_missing: bool) -> Vec<String>;
}

// ==========================================
// RecordValidator Trait
// ==========================================
// 用途: 规则表校验
// 实现者: DqValidator
pub trait RecordValidator: Send + Sync {
    fn validate(&self, records: &[CandidateRecord]) -> ValidationResult;

    /// 纯文本报告（每条 "Row R, field F: message"）
    fn generate_report(&self, result: &ValidationResult) -> String;
}

// ==========================================
// DuplicateDetector Trait
// ==========================================
// 用途: 近似重复分组
// 实现者: FuzzyDuplicateDetector
pub trait DuplicateDetector: Send + Sync {
    fn detect(&self, records: &[CandidateRecord], options: &DuplicateOptions) -> DuplicateReport;
}
