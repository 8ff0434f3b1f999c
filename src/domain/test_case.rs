// ==========================================
// 测试用例导入 - 测试用例领域模型
// ==========================================
// 职责: 规范字段表 / 候选记录 / 落库草稿 / 容器统计
// 红线: CandidateRecord 永远结构完整（每个规范字段都有值，未解析则取默认值）
// ==========================================

use crate::domain::types::{Category, Environment, Priority, TestStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// CanonicalField - 规范字段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    Name,
    Description,
    Preconditions,
    TestSteps,
    ExpectedResult,
    ActualResult,
    TestData,
    Status,
    Priority,
    Category,
    Environment,
    AssignedTester,
    Tags,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 13] = [
        CanonicalField::Name,
        CanonicalField::Description,
        CanonicalField::Preconditions,
        CanonicalField::TestSteps,
        CanonicalField::ExpectedResult,
        CanonicalField::ActualResult,
        CanonicalField::TestData,
        CanonicalField::Status,
        CanonicalField::Priority,
        CanonicalField::Category,
        CanonicalField::Environment,
        CanonicalField::AssignedTester,
        CanonicalField::Tags,
    ];

    /// 规范键名（camelCase）
    pub fn key(&self) -> &'static str {
        match self {
            CanonicalField::Name => "name",
            CanonicalField::Description => "description",
            CanonicalField::Preconditions => "preconditions",
            CanonicalField::TestSteps => "testSteps",
            CanonicalField::ExpectedResult => "expectedResult",
            CanonicalField::ActualResult => "actualResult",
            CanonicalField::TestData => "testData",
            CanonicalField::Status => "status",
            CanonicalField::Priority => "priority",
            CanonicalField::Category => "category",
            CanonicalField::Environment => "environment",
            CanonicalField::AssignedTester => "assignedTester",
            CanonicalField::Tags => "tags",
        }
    }

    /// 固定同义词表（在大小写/分隔符变体之后尝试）
    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::Name => &[
                "Test Case",
                "Test Case Name",
                "Test Case Title",
                "Test Name",
                "Case Name",
                "Title",
                "Summary",
                "TC Name",
            ],
            CanonicalField::Description => {
                &["Desc", "Details", "Test Description", "Objective", "Purpose"]
            }
            CanonicalField::Preconditions => {
                &["Precondition", "Prerequisites", "Prerequisite", "Setup"]
            }
            CanonicalField::TestSteps => &["Steps", "Step", "Procedure", "Actions", "Test Procedure"],
            CanonicalField::ExpectedResult => &[
                "Expected",
                "Expected Results",
                "Expected Outcome",
                "Expected Behavior",
                "Expected Behaviour",
            ],
            CanonicalField::ActualResult => &["Actual", "Actual Results", "Actual Outcome", "Result"],
            CanonicalField::TestData => &["Data", "Input", "Input Data"],
            CanonicalField::Status => &["Test Status", "State", "Execution Status", "Result Status"],
            CanonicalField::Priority => &["Severity", "Importance", "Test Priority"],
            CanonicalField::Category => &["Type", "Test Type", "Test Category"],
            CanonicalField::Environment => &["Env", "Test Environment", "Platform"],
            CanonicalField::AssignedTester => &[
                "Assigned To",
                "Owner",
                "Assignee",
                "Tester",
                "Executed By",
            ],
            CanonicalField::Tags => &["Tag", "Labels", "Label", "Keywords"],
        }
    }

    /// 字段未解析时的默认值
    pub fn default_value(&self) -> &'static str {
        match self {
            CanonicalField::Status => TestStatus::default().as_str(),
            CanonicalField::Priority => Priority::default().as_str(),
            CanonicalField::Category => Category::default().as_str(),
            CanonicalField::Environment => Environment::default().as_str(),
            _ => "",
        }
    }

    /// 解析字段名（接受 camelCase / snake_case / 空格分隔，大小写不敏感）
    pub fn parse(name: &str) -> Option<Self> {
        let folded: String = name
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.key().to_lowercase() == folded)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ==========================================
// CandidateRecord - 候选记录
// ==========================================
// 用途: FieldMapper 产出，AutoFixer 原地修改，Validator/DuplicateDetector 只读
// 生命周期: 仅在导入流程内
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    // 元信息
    pub row_index: usize,            // 数据行号（从 1 开始，不含表头）
    pub project_id: Option<String>,  // 目标项目
    pub suite_id: Option<String>,    // 目标用例集

    // 规范字段（未强制类型，枚举合法性由 Validator 判定）
    pub name: String,
    pub description: String,
    pub preconditions: String,
    pub test_steps: String,
    pub expected_result: String,
    pub actual_result: String,
    pub test_data: String,
    pub status: String,
    pub priority: String,
    pub category: String,
    pub environment: String,
    pub assigned_tester: String,
    pub tags: String,
}

impl CandidateRecord {
    /// 以默认值构造完整记录
    pub fn with_defaults(row_index: usize) -> Self {
        let mut record = Self {
            row_index,
            project_id: None,
            suite_id: None,
            name: String::new(),
            description: String::new(),
            preconditions: String::new(),
            test_steps: String::new(),
            expected_result: String::new(),
            actual_result: String::new(),
            test_data: String::new(),
            status: String::new(),
            priority: String::new(),
            category: String::new(),
            environment: String::new(),
            assigned_tester: String::new(),
            tags: String::new(),
        };
        for field in CanonicalField::ALL {
            record.set(field, field.default_value().to_string());
        }
        record
    }

    pub fn get(&self, field: CanonicalField) -> &str {
        match field {
            CanonicalField::Name => &self.name,
            CanonicalField::Description => &self.description,
            CanonicalField::Preconditions => &self.preconditions,
            CanonicalField::TestSteps => &self.test_steps,
            CanonicalField::ExpectedResult => &self.expected_result,
            CanonicalField::ActualResult => &self.actual_result,
            CanonicalField::TestData => &self.test_data,
            CanonicalField::Status => &self.status,
            CanonicalField::Priority => &self.priority,
            CanonicalField::Category => &self.category,
            CanonicalField::Environment => &self.environment,
            CanonicalField::AssignedTester => &self.assigned_tester,
            CanonicalField::Tags => &self.tags,
        }
    }

    pub fn get_mut(&mut self, field: CanonicalField) -> &mut String {
        match field {
            CanonicalField::Name => &mut self.name,
            CanonicalField::Description => &mut self.description,
            CanonicalField::Preconditions => &mut self.preconditions,
            CanonicalField::TestSteps => &mut self.test_steps,
            CanonicalField::ExpectedResult => &mut self.expected_result,
            CanonicalField::ActualResult => &mut self.actual_result,
            CanonicalField::TestData => &mut self.test_data,
            CanonicalField::Status => &mut self.status,
            CanonicalField::Priority => &mut self.priority,
            CanonicalField::Category => &mut self.category,
            CanonicalField::Environment => &mut self.environment,
            CanonicalField::AssignedTester => &mut self.assigned_tester,
            CanonicalField::Tags => &mut self.tags,
        }
    }

    pub fn set(&mut self, field: CanonicalField, value: String) {
        *self.get_mut(field) = value;
    }
}

// ==========================================
// TestCaseDraft - 落库草稿（强类型）
// ==========================================
// 用途: 处理阶段由 CandidateRecord 转换，交给 TestCaseStore::create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseDraft {
    pub project_id: Option<String>,
    pub suite_id: Option<String>,
    pub name: String,
    pub description: String,
    pub preconditions: String,
    pub test_steps: String,
    pub expected_result: String,
    pub actual_result: String,
    pub test_data: String,
    pub status: TestStatus,
    pub priority: Priority,
    pub category: Category,
    pub environment: Environment,
    pub assigned_tester: Option<String>,
    pub tags: Vec<String>,
    pub source_row: usize,
}

impl TestCaseDraft {
    /// 候选记录 → 强类型草稿
    ///
    /// # 返回
    /// - Err(String): 枚举字段不在固定集合内（调用方应先过滤含 error 的行）
    pub fn from_candidate(record: &CandidateRecord) -> Result<Self, String> {
        let status = TestStatus::parse(&record.status)
            .ok_or_else(|| format!("invalid status '{}'", record.status))?;
        let priority = Priority::parse(&record.priority)
            .ok_or_else(|| format!("invalid priority '{}'", record.priority))?;
        let category = Category::parse(&record.category)
            .ok_or_else(|| format!("invalid category '{}'", record.category))?;
        let environment = Environment::parse(&record.environment)
            .ok_or_else(|| format!("invalid environment '{}'", record.environment))?;

        let tags = record
            .tags
            .split(|c: char| c == ',' || c == ';')
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect();

        let assigned_tester = Some(record.assigned_tester.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Self {
            project_id: record.project_id.clone(),
            suite_id: record.suite_id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            preconditions: record.preconditions.clone(),
            test_steps: record.test_steps.clone(),
            expected_result: record.expected_result.clone(),
            actual_result: record.actual_result.clone(),
            test_data: record.test_data.clone(),
            status,
            priority,
            category,
            environment,
            assigned_tester,
            tags,
            source_row: record.row_index,
        })
    }
}

// ==========================================
// TestCase - 已落库测试用例
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    #[serde(flatten)]
    pub draft: TestCaseDraft,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// ContainerStats - 容器（项目）聚合统计
// ==========================================
// 用途: 导入前快照，回滚时恢复
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStats {
    pub container_id: String,
    pub total_cases: i64,
    pub import_count: i64,
    pub last_import_at: Option<DateTime<Utc>>,
}

impl ContainerStats {
    pub fn empty(container_id: &str) -> Self {
        Self {
            container_id: container_id.to_string(),
            total_cases: 0,
            import_count: 0,
            last_import_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_defaults_is_complete() {
        let record = CandidateRecord::with_defaults(3);
        assert_eq!(record.row_index, 3);
        assert_eq!(record.status, "not_run");
        assert_eq!(record.priority, "medium");
        assert_eq!(record.category, "functional");
        assert_eq!(record.environment, "testing");
        assert_eq!(record.name, "");
    }

    #[test]
    fn test_canonical_field_parse_variants() {
        assert_eq!(CanonicalField::parse("testSteps"), Some(CanonicalField::TestSteps));
        assert_eq!(CanonicalField::parse("test_steps"), Some(CanonicalField::TestSteps));
        assert_eq!(CanonicalField::parse("Expected Result"), Some(CanonicalField::ExpectedResult));
        assert_eq!(CanonicalField::parse("owner"), None);
    }

    #[test]
    fn test_draft_from_candidate_splits_tags() {
        let mut record = CandidateRecord::with_defaults(1);
        record.name = "Login".to_string();
        record.tags = "auth, smoke;ui ,".to_string();
        record.status = "pass".to_string();

        let draft = TestCaseDraft::from_candidate(&record).unwrap();
        assert_eq!(draft.tags, vec!["auth", "smoke", "ui"]);
        assert_eq!(draft.status, TestStatus::Pass);
        assert_eq!(draft.assigned_tester, None);
        assert_eq!(draft.source_row, 1);
    }

    #[test]
    fn test_draft_from_candidate_rejects_bad_enum() {
        let mut record = CandidateRecord::with_defaults(1);
        record.priority = "urgent".to_string();
        let err = TestCaseDraft::from_candidate(&record).unwrap_err();
        assert!(err.contains("priority"));
    }
}
