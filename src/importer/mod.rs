// ==========================================
// 测试用例导入 - 导入层
// ==========================================
// 职责: 外部文件 → 候选记录 → 校验/查重 → 测试用例
// 支持: 分隔符文本, JSON, 电子表格
// ==========================================

// 模块声明
pub mod case_importer_impl;
pub mod data_cleaner;
pub mod dq_validator;
pub mod duplicate_detector;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;
pub mod progress;

// 重导出核心类型
pub use case_importer_impl::TestCaseImporterImpl;
pub use data_cleaner::DataCleaner;
pub use dq_validator::{DqValidator, ValidationRule};
pub use duplicate_detector::{merge_fields, resolve_group, FuzzyDuplicateDetector, PairComparison};
pub use error::ImportError;
pub use field_mapper::SynonymFieldMapper;
pub use file_parser::{detect_delimiter, detect_format, normalize_header, UniversalFileParser};
pub use progress::ProgressReporter;

// 重导出 Trait 接口
pub use importer_trait::{
    AutoFixer, DuplicateDetector, FieldMapper, FileParser, RecordValidator, TestCaseImporter,
};
