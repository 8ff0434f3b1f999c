// ==========================================
// 测试用例导入 - 自动修复器实现
// ==========================================
// 职责: TRIM / 状态与优先级同义词标准化 / 枚举字段小写 / 缺失字段补默认值
// 红线: 每一次修改都输出一条 "Row N: ..." 审计记录；幂等
// ==========================================

use crate::domain::test_case::{CandidateRecord, CanonicalField};
use crate::domain::types::{Category, Environment, Priority, TestStatus};
use crate::importer::importer_trait::AutoFixer;
use tracing::debug;

/// 状态同义词（小写 → 规范值）
const STATUS_SYNONYMS: &[(&str, TestStatus)] = &[
    ("pass", TestStatus::Pass),
    ("passed", TestStatus::Pass),
    ("success", TestStatus::Pass),
    ("successful", TestStatus::Pass),
    ("ok", TestStatus::Pass),
    ("fail", TestStatus::Fail),
    ("failed", TestStatus::Fail),
    ("failure", TestStatus::Fail),
    ("error", TestStatus::Fail),
    ("blocked", TestStatus::Blocked),
    ("block", TestStatus::Blocked),
    ("skipped", TestStatus::Skipped),
    ("skip", TestStatus::Skipped),
    ("not_run", TestStatus::NotRun),
    ("not run", TestStatus::NotRun),
    ("notrun", TestStatus::NotRun),
    ("not-run", TestStatus::NotRun),
    ("pending", TestStatus::NotRun),
    ("todo", TestStatus::NotRun),
    ("new", TestStatus::NotRun),
];

/// 优先级同义词（小写 → 规范值）
const PRIORITY_SYNONYMS: &[(&str, Priority)] = &[
    ("critical", Priority::Critical),
    ("blocker", Priority::Critical),
    ("p0", Priority::Critical),
    ("high", Priority::High),
    ("urgent", Priority::High),
    ("important", Priority::High),
    ("p1", Priority::High),
    ("medium", Priority::Medium),
    ("normal", Priority::Medium),
    ("moderate", Priority::Medium),
    ("p2", Priority::Medium),
    ("low", Priority::Low),
    ("minor", Priority::Low),
    ("trivial", Priority::Low),
    ("p3", Priority::Low),
];

/// 环境同义词（小写 → 规范值）
const ENVIRONMENT_SYNONYMS: &[(&str, Environment)] = &[
    ("development", Environment::Development),
    ("dev", Environment::Development),
    ("testing", Environment::Testing),
    ("test", Environment::Testing),
    ("qa", Environment::Testing),
    ("staging", Environment::Staging),
    ("stage", Environment::Staging),
    ("production", Environment::Production),
    ("prod", Environment::Production),
];

pub struct DataCleaner;

impl AutoFixer for DataCleaner {
    fn apply_fixes(&self, records: &mut [CandidateRecord], generate_missing: bool) -> Vec<String> {
        let mut fixes = Vec::new();

        for record in records.iter_mut() {
            let row = record.row_index;

            // 1. TRIM 所有文本字段
            for field in CanonicalField::ALL {
                let current = record.get(field);
                let trimmed = self.clean_text(current);
                if trimmed != current {
                    record.set(field, trimmed);
                    fixes.push(format!("Row {}: Trimmed whitespace in {}", row, field));
                }
            }

            // 2. 状态/优先级/环境 同义词标准化
            if let Some(fix) = normalize_with(record, CanonicalField::Status, |v| {
                lookup(STATUS_SYNONYMS, v).map(|s| s.as_str())
            }) {
                fixes.push(fix);
            }
            if let Some(fix) = normalize_with(record, CanonicalField::Priority, |v| {
                lookup(PRIORITY_SYNONYMS, v).map(|p| p.as_str())
            }) {
                fixes.push(fix);
            }
            if let Some(fix) = normalize_with(record, CanonicalField::Environment, |v| {
                lookup(ENVIRONMENT_SYNONYMS, v).map(|e| e.as_str())
            }) {
                fixes.push(fix);
            }

            // 3. 分类: 仅大小写修正
            if let Some(fix) = normalize_with(record, CanonicalField::Category, |v| {
                Category::parse(&v.to_lowercase()).map(|c| c.as_str())
            }) {
                fixes.push(fix);
            }

            // 4. 补齐缺失字段
            if generate_missing {
                for field in [
                    CanonicalField::Status,
                    CanonicalField::Priority,
                    CanonicalField::Category,
                    CanonicalField::Environment,
                ] {
                    if record.get(field).is_empty() {
                        let default = field.default_value();
                        record.set(field, default.to_string());
                        fixes.push(format!("Row {}: Set missing {} to '{}'", row, field, default));
                    }
                }
            }
        }

        debug!(fixes = fixes.len(), "自动修复完成");
        fixes
    }
}

impl DataCleaner {
    /// 清洗文本字段（TRIM）
    pub fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }
}

fn lookup<T: Copy>(table: &[(&str, T)], value: &str) -> Option<T> {
    let key = value.trim().to_lowercase();
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// 以查表结果替换字段值；值变化时返回审计记录
fn normalize_with<F>(record: &mut CandidateRecord, field: CanonicalField, resolve: F) -> Option<String>
where
    F: Fn(&str) -> Option<&'static str>,
{
    let current = record.get(field);
    if current.is_empty() {
        return None;
    }
    let canonical = resolve(current)?;
    if canonical == current {
        return None;
    }

    let fix = format!(
        "Row {}: Normalized {} '{}' to '{}'",
        record.row_index, field, current, canonical
    );
    record.set(field, canonical.to_string());
    Some(fix)
}
