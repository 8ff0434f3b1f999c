// ==========================================
// 测试用例导入 - 导入管道领域模型
// ==========================================
// 职责: 解析产物 / 校验结果 / 查重结果 / 导入结果 / 导入会话
// ==========================================

use crate::domain::test_case::{CandidateRecord, ContainerStats, TestCase};
use crate::domain::types::{FileFormat, ImportStage, MatchType, SessionStatus, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// CellValue - 原始单元格值（带标签）
// ==========================================
// 红线: 只在 FieldMapper 边界做显式文本化，后续阶段不再接触动态类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// 显式文本化（整数值的浮点数不带小数部分）
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::Bool(b) => b.to_string(),
        }
    }

    /// 去空白后为空
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

// ==========================================
// RawRow - 原始行（有序 表头 → 值）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    cells: Vec<(String, CellValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加或覆盖同名列（保持首次出现的位置）
    pub fn insert(&mut self, header: impl Into<String>, value: CellValue) {
        let header = header.into();
        match self.cells.iter_mut().find(|(h, _)| *h == header) {
            Some(slot) => slot.1 = value,
            None => self.cells.push((header, value)),
        }
    }

    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(h, _)| h == header).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// 所有单元格去空白后均为空
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_blank())
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

// ==========================================
// ParseOptions - 解析选项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOptions {
    pub file_name: Option<String>,   // 用于按扩展名判断格式
    pub format: Option<FileFormat>,  // 显式指定格式（优先级最高）
    pub delimiter: Option<char>,     // 显式指定分隔符
    pub empty_row_warn_ratio: f64,   // 空白行占比超过该值时告警
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            file_name: None,
            format: None,
            delimiter: None,
            empty_row_warn_ratio: 0.5,
        }
    }
}

// ==========================================
// ParseOutput - 解析结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseMeta {
    pub format: FileFormat,
    pub delimiter: Option<char>,     // 仅分隔符文本
    pub encoding: String,
    pub headers: Vec<String>,        // 规范化后的表头
    pub total_rows: usize,           // 数据行数（含空白行）
    pub empty_rows: usize,           // 空白行数（已丢弃）
    pub sheet_name: Option<String>,  // 仅表格文件
}

impl ParseMeta {
    pub fn new(format: FileFormat) -> Self {
        Self {
            format,
            delimiter: None,
            encoding: "utf-8".to_string(),
            headers: Vec::new(),
            total_rows: 0,
            empty_rows: 0,
            sheet_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOutput {
    pub rows: Vec<RawRow>,
    pub errors: Vec<String>,   // 非空即致命：rows 必为空
    pub warnings: Vec<String>,
    pub meta: ParseMeta,
}

impl ParseOutput {
    /// 致命失败：零行 + 一条错误
    pub fn fatal(meta: ParseMeta, message: impl Into<String>, warnings: Vec<String>) -> Self {
        Self {
            rows: Vec::new(),
            errors: vec![message.into()],
            warnings,
            meta,
        }
    }

    pub fn is_fatal(&self) -> bool {
        !self.errors.is_empty()
    }
}

// ==========================================
// ValidationIssue / ValidationResult - 校验结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub row_index: usize,
    pub field: String,
    pub value: String,
    pub message: String,
    pub severity: Severity,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub total_rows: usize,
    pub valid_rows: usize,   // 无 error 的行
    pub error_rows: usize,   // 至少一条 error 的不同行数
    pub warning_rows: usize, // 至少一条 warning 的不同行数
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub info: Vec<ValidationIssue>,
    pub summary: ValidationSummary,
}

impl ValidationResult {
    /// 指定行是否有 error 级问题
    pub fn row_has_errors(&self, row_index: usize) -> bool {
        self.errors.iter().any(|i| i.row_index == row_index)
    }
}

// ==========================================
// DuplicateGroup / DuplicateReport - 查重结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    pub original: CandidateRecord,
    pub duplicates: Vec<CandidateRecord>,
    pub match_type: MatchType,
    pub similarity: f64,             // 组内原始记录与各重复记录的最低聚合相似度
    pub matched_fields: Vec<String>, // 首次出现顺序的并集
}

impl DuplicateGroup {
    /// 组内全部记录（原始记录在前）
    pub fn members(&self) -> impl Iterator<Item = &CandidateRecord> {
        std::iter::once(&self.original).chain(self.duplicates.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateSummary {
    pub total_records: usize,
    pub unique_records: usize,
    pub duplicate_groups: usize,
    pub duplicate_records: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateReport {
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub unique_items: Vec<CandidateRecord>,
    pub total_duplicates: usize,
    pub summary: DuplicateSummary,
}

// ==========================================
// ProgressEvent - 进度事件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub stage: ImportStage,
    pub percent: u8,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

// ==========================================
// ImportResult - 导入结果（对调用方）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    pub row_index: usize,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub total_rows: usize,
    pub successful_imports: usize,
    pub skipped_rows: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success: bool,
    pub imported: Vec<TestCase>,
    pub skipped: Vec<SkippedRow>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub duplicates: Option<DuplicateReport>,
    pub validation: Option<ValidationResult>,
    pub fixes_applied: Vec<String>,
    pub summary: ImportSummary,
    pub session_id: Option<String>,
}

impl ImportResult {
    /// 整体失败：空导入列表 + 唯一错误
    pub fn failure(message: impl Into<String>, processing_time_ms: u64) -> Self {
        Self {
            success: false,
            imported: Vec::new(),
            skipped: Vec::new(),
            errors: vec![message.into()],
            warnings: Vec::new(),
            duplicates: None,
            validation: None,
            fixes_applied: Vec::new(),
            summary: ImportSummary {
                error_count: 1,
                processing_time_ms,
                ..ImportSummary::default()
            },
            session_id: None,
        }
    }
}

// ==========================================
// ImportSession - 导入会话（历史）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub total_rows: usize,
    pub imported: usize,
    pub skipped: usize,
    pub errors: usize,
    pub warnings: usize,
    pub duplicates: usize,
    pub fixes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackSnapshot {
    pub created_ids: Vec<String>,
    pub prior_stats: Option<ContainerStats>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSession {
    // ===== 不可变事实 =====
    pub session_id: String,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: Option<FileFormat>,
    pub project_id: Option<String>,
    pub suite_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub summary: SessionSummary,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub imported_test_case_ids: Vec<String>,
    pub snapshot: Option<RollbackSnapshot>,

    // ===== 可变状态（仅 RollbackManager 修改）=====
    pub status: SessionStatus,
    pub rolled_back_at: Option<DateTime<Utc>>,
}

impl ImportSession {
    /// 至少导入一条且已捕获快照
    pub fn can_rollback(&self) -> bool {
        !self.imported_test_case_ids.is_empty() && self.snapshot.is_some()
    }
}
