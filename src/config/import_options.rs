// ==========================================
// 测试用例导入 - 单次导入选项
// ==========================================
// 职责: 调用方每次导入时传入的开关与参数
// ==========================================

use crate::domain::test_case::CanonicalField;
use crate::domain::types::{FileFormat, ResolutionStrategy};
use serde::{Deserialize, Serialize};

// ==========================================
// DuplicateOptions - 查重选项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DuplicateOptions {
    pub fields: Vec<CanonicalField>, // 参与比较的字段
    pub similarity_threshold: f64,   // [0, 1]
    pub case_sensitive: bool,
    pub trim_whitespace: bool,
}

impl Default for DuplicateOptions {
    fn default() -> Self {
        Self {
            fields: vec![CanonicalField::Name],
            similarity_threshold: 0.8,
            case_sensitive: false,
            trim_whitespace: true,
        }
    }
}

// ==========================================
// ImportOptions - 导入选项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportOptions {
    // 目标容器
    pub file_name: Option<String>,
    pub project_id: Option<String>,
    pub suite_id: Option<String>,

    // 校验与修复
    pub auto_fix: bool,
    pub generate_missing_fields: bool,
    pub strict_mode: bool,

    // 查重
    pub detect_duplicates: bool,
    pub duplicate_options: DuplicateOptions,
    pub duplicate_strategy: Option<ResolutionStrategy>,

    // 覆盖项
    pub batch_size: Option<usize>,
    pub format: Option<FileFormat>,
    pub delimiter: Option<char>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            file_name: None,
            project_id: None,
            suite_id: None,
            auto_fix: true,
            generate_missing_fields: false,
            strict_mode: false,
            detect_duplicates: true,
            duplicate_options: DuplicateOptions::default(),
            duplicate_strategy: None,
            batch_size: None,
            format: None,
            delimiter: None,
        }
    }
}
