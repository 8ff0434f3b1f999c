// ==========================================
// 测试用例导入 - 数据质量校验器实现
// ==========================================
// 职责: 规则表校验 + 纯文本报告
// 级别:
// - error:   必填缺失 / 枚举字段越界
// - warning: 占位名称 / 文本中的畸形 URL / 畸形邮箱 / 缺少预期结果
// - info:    描述过短
// 红线: 字段级问题只作为数据返回，从不 Err
// ==========================================

use crate::domain::import::{ValidationIssue, ValidationResult, ValidationSummary};
use crate::domain::test_case::{CandidateRecord, CanonicalField};
use crate::domain::types::{Category, Environment, Priority, Severity, TestStatus};
use crate::importer::importer_trait::RecordValidator;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt::Write as _;

/// 占位名称（小写比较）
const PLACEHOLDER_NAMES: &[&str] = &[
    "untitled",
    "new test",
    "new test case",
    "test",
    "test case",
    "testcase",
    "todo",
    "tbd",
    "placeholder",
    "sample",
];

static URL_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:https?:/*|www\.)\S*").expect("valid regex"));
static VALID_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:https?://|www\.)[a-z0-9](?:[a-z0-9-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]*[a-z0-9])?)*(?::\d{1,5})?(?:[/?#]\S*)?$",
    )
    .expect("valid regex")
});
static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[A-Za-z]{2,}$").expect("valid regex"));

type Predicate = Box<dyn Fn(&str) -> bool + Send + Sync>;
type Suggest = Box<dyn Fn(&str) -> Vec<String> + Send + Sync>;

// ==========================================
// ValidationRule - 规则表条目
// ==========================================
pub struct ValidationRule {
    pub field: CanonicalField,
    pub required: bool,
    pub severity: Severity,
    pub message: String,
    predicate: Predicate, // 返回 true 表示通过
    suggestions: Suggest,
}

impl ValidationRule {
    /// 必填规则（去空白后非空）
    pub fn required(field: CanonicalField, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            field,
            required: true,
            severity,
            message: message.into(),
            predicate: Box::new(|v| !v.trim().is_empty()),
            suggestions: Box::new(|_| Vec::new()),
        }
    }

    /// 谓词规则
    pub fn check<P>(field: CanonicalField, severity: Severity, message: impl Into<String>, predicate: P) -> Self
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            field,
            required: false,
            severity,
            message: message.into(),
            predicate: Box::new(predicate),
            suggestions: Box::new(|_| Vec::new()),
        }
    }

    pub fn with_suggestions<S>(mut self, suggest: S) -> Self
    where
        S: Fn(&str) -> Vec<String> + Send + Sync + 'static,
    {
        self.suggestions = Box::new(suggest);
        self
    }

    /// 枚举字段规则（必须是固定集合之一）
    fn one_of(field: CanonicalField, allowed: &'static [&'static str]) -> Self {
        let message = format!("{} must be one of: {}", capitalize(field.key()), allowed.join(", "));
        Self::check(field, Severity::Error, message, move |v| allowed.iter().any(|a| *a == v))
            .with_suggestions(move |v| closest_values(v, allowed))
    }

    fn evaluate(&self, record: &CandidateRecord) -> Option<ValidationIssue> {
        let value = record.get(self.field);
        if (self.predicate)(value) {
            return None;
        }
        Some(ValidationIssue {
            row_index: record.row_index,
            field: self.field.key().to_string(),
            value: value.to_string(),
            message: self.message.clone(),
            severity: self.severity,
            suggestions: (self.suggestions)(value),
        })
    }
}

const STATUS_VALUES: &[&str] = &["not_run", "pass", "fail", "blocked", "skipped"];
const PRIORITY_VALUES: &[&str] = &["low", "medium", "high", "critical"];
const CATEGORY_VALUES: &[&str] = &[
    "functional",
    "regression",
    "smoke",
    "integration",
    "performance",
    "security",
    "usability",
    "other",
];
const ENVIRONMENT_VALUES: &[&str] = &["development", "testing", "staging", "production"];

// ==========================================
// DqValidator - 规则表校验器
// ==========================================
pub struct DqValidator {
    rules: Vec<ValidationRule>,
}

impl DqValidator {
    /// # 参数
    /// - min_description_length: 描述最短长度（低于则 info）
    pub fn new(min_description_length: usize) -> Self {
        let rules = vec![
            // ===== error =====
            ValidationRule::required(CanonicalField::Name, Severity::Error, "Name is required"),
            ValidationRule::one_of(CanonicalField::Status, STATUS_VALUES),
            ValidationRule::one_of(CanonicalField::Priority, PRIORITY_VALUES),
            ValidationRule::one_of(CanonicalField::Category, CATEGORY_VALUES),
            ValidationRule::one_of(CanonicalField::Environment, ENVIRONMENT_VALUES),
            // ===== warning =====
            ValidationRule::check(
                CanonicalField::Name,
                Severity::Warning,
                "Name looks like a placeholder",
                |v| !is_placeholder_name(v),
            )
            .with_suggestions(|_| vec!["Use a descriptive test case name".to_string()]),
            ValidationRule::check(
                CanonicalField::Description,
                Severity::Warning,
                "Description contains a malformed URL",
                |v| malformed_urls(v).is_empty(),
            )
            .with_suggestions(malformed_urls),
            ValidationRule::check(
                CanonicalField::TestSteps,
                Severity::Warning,
                "Test steps contain a malformed URL",
                |v| malformed_urls(v).is_empty(),
            )
            .with_suggestions(malformed_urls),
            ValidationRule::check(
                CanonicalField::AssignedTester,
                Severity::Warning,
                "Assignee looks like an email address but is not valid",
                |v| !v.contains('@') || EMAIL.is_match(v.trim()),
            ),
            ValidationRule::required(
                CanonicalField::ExpectedResult,
                Severity::Warning,
                "Expected result is missing",
            ),
            // ===== info =====
            ValidationRule::check(
                CanonicalField::Description,
                Severity::Info,
                format!("Description is shorter than {} characters", min_description_length),
                move |v| v.trim().chars().count() >= min_description_length,
            ),
        ];

        // 枚举常量与领域类型保持一致
        debug_assert!(TestStatus::ALL.iter().all(|s| STATUS_VALUES.contains(&s.as_str())));
        debug_assert!(Priority::ALL.iter().all(|p| PRIORITY_VALUES.contains(&p.as_str())));
        debug_assert!(Category::ALL.iter().all(|c| CATEGORY_VALUES.contains(&c.as_str())));
        debug_assert!(Environment::ALL.iter().all(|e| ENVIRONMENT_VALUES.contains(&e.as_str())));

        Self { rules }
    }

    /// 自定义规则表
    pub fn with_rules(rules: Vec<ValidationRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }
}

impl Default for DqValidator {
    fn default() -> Self {
        Self::new(10)
    }
}

impl RecordValidator for DqValidator {
    fn validate(&self, records: &[CandidateRecord]) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut info = Vec::new();

        for record in records {
            for rule in &self.rules {
                if let Some(issue) = rule.evaluate(record) {
                    match issue.severity {
                        Severity::Error => errors.push(issue),
                        Severity::Warning => warnings.push(issue),
                        Severity::Info => info.push(issue),
                    }
                }
            }
        }

        let error_rows: HashSet<usize> = errors.iter().map(|i| i.row_index).collect();
        let warning_rows: HashSet<usize> = warnings.iter().map(|i| i.row_index).collect();

        let summary = ValidationSummary {
            total_rows: records.len(),
            valid_rows: records.len().saturating_sub(error_rows.len()),
            error_rows: error_rows.len(),
            warning_rows: warning_rows.len(),
        };

        tracing::debug!(
            errors = errors.len(),
            warnings = warnings.len(),
            info = info.len(),
            error_rows = summary.error_rows,
            "校验完成"
        );

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            info,
            summary,
        }
    }

    fn generate_report(&self, result: &ValidationResult) -> String {
        let mut report = String::new();
        let _ = writeln!(
            report,
            "Validation report: {} rows, {} valid, {} errors, {} warnings, {} info",
            result.summary.total_rows,
            result.summary.valid_rows,
            result.errors.len(),
            result.warnings.len(),
            result.info.len()
        );

        for (title, issues) in [
            ("Errors", &result.errors),
            ("Warnings", &result.warnings),
            ("Info", &result.info),
        ] {
            if issues.is_empty() {
                continue;
            }
            let _ = writeln!(report, "\n{}:", title);
            for issue in issues {
                let _ = writeln!(
                    report,
                    "Row {}, field {}: {}",
                    issue.row_index, issue.field, issue.message
                );
            }
        }

        report
    }
}

// ==========================================
// 规则辅助函数
// ==========================================

fn is_placeholder_name(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    if lower.is_empty() {
        return false; // 缺失由必填规则报告
    }
    PLACEHOLDER_NAMES.contains(&lower.as_str())
        || lower.starts_with("untitled")
        || lower.starts_with("new test")
}

/// 找出文本中的畸形 URL
fn malformed_urls(text: &str) -> Vec<String> {
    URL_TOKEN
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(|c: char| ".,;:!?)]}\"'".contains(c)))
        .filter(|token| !VALID_URL.is_match(token))
        .map(|token| token.to_string())
        .collect()
}

/// 按相似度给出最接近的合法值
fn closest_values(value: &str, allowed: &[&str]) -> Vec<String> {
    let needle = value.trim().to_lowercase();
    let mut scored: Vec<(f64, &str)> = allowed
        .iter()
        .map(|candidate| {
            let score = if !needle.is_empty() && candidate.starts_with(&needle) {
                1.0
            } else {
                strsim::normalized_levenshtein(&needle, candidate)
            };
            (score, *candidate)
        })
        .filter(|(score, _)| *score >= 0.4)
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    if scored.is_empty() {
        allowed.iter().map(|s| s.to_string()).collect()
    } else {
        scored.into_iter().take(3).map(|(_, s)| s.to_string()).collect()
    }
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
