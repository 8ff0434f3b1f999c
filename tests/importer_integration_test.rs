// ==========================================
// 导入管道集成测试
// ==========================================
// 测试目标: 端到端验证 解析 → 映射 → 修复/校验 → 查重 → 落库 → 历史
// ==========================================

mod test_helpers;

use case_import::config::{DuplicateOptions, ImportConfig, ImportOptions};
use case_import::domain::test_case::CanonicalField;
use case_import::domain::types::{MatchType, Priority, SessionStatus, TestStatus};
use case_import::importer::{ProgressReporter, TestCaseImporter};
use case_import::logging;
use case_import::repository::TestCaseStore;

fn options(file_name: &str) -> ImportOptions {
    ImportOptions {
        file_name: Some(file_name.to_string()),
        project_id: Some("proj-1".to_string()),
        ..ImportOptions::default()
    }
}

#[tokio::test]
async fn test_exact_duplicate_group_example() {
    logging::init_test();
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let env = test_helpers::create_test_env(&db_path, ImportConfig::default()).await;

    let csv = test_helpers::build_csv(
        &["Name", "Description"],
        &[vec!["TC001", "X"], vec!["TC002", "Y"], vec!["TC001", "X"]],
    );
    let opts = ImportOptions {
        duplicate_options: DuplicateOptions {
            fields: vec![CanonicalField::Name],
            similarity_threshold: 0.95,
            ..DuplicateOptions::default()
        },
        ..options("cases.csv")
    };

    let result = env
        .importer
        .import_bytes(csv.into_bytes(), opts, ProgressReporter::disabled())
        .await;

    assert!(result.success);
    let report = result.duplicates.expect("duplicate report");
    assert_eq!(report.duplicate_groups.len(), 1);
    let group = &report.duplicate_groups[0];
    assert_eq!(group.original.row_index, 1);
    assert_eq!(group.duplicates.len(), 1);
    assert_eq!(group.match_type, MatchType::Exact);
    assert_eq!(report.unique_items.len(), 1);
    assert_eq!(report.unique_items[0].name, "TC002");

    // 未指定处理策略时仅报告，不丢弃
    assert_eq!(result.imported.len(), 3);
}

#[tokio::test]
async fn test_strict_mode_missing_name() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let env = test_helpers::create_test_env(&db_path, ImportConfig::default()).await;

    let csv = "Name,Description,Expected Result\n,Open the settings page,Page shown\n";
    let opts = ImportOptions {
        strict_mode: true,
        ..options("cases.csv")
    };

    let result = env
        .importer
        .import_bytes(csv.as_bytes().to_vec(), opts, ProgressReporter::disabled())
        .await;

    assert!(!result.success);
    assert!(result.imported.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0], "Row 1, field name: Name is required");

    let validation = result.validation.expect("validation result");
    assert_eq!(validation.errors.len(), 1);
    assert_eq!(validation.errors[0].row_index, 1);
    assert_eq!(validation.errors[0].field, "name");

    // 严格模式失败不落库
    assert_eq!(env.store.count_by_project("proj-1").await.unwrap(), 0);
    let session = env
        .history
        .get(result.session_id.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(session.status, SessionStatus::Failed);
}

#[tokio::test]
async fn test_header_only_file() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let env = test_helpers::create_test_env(&db_path, ImportConfig::default()).await;

    let result = env
        .importer
        .import_bytes(
            b"Name,Description\n".to_vec(),
            options("empty.csv"),
            ProgressReporter::disabled(),
        )
        .await;

    assert!(result.success);
    assert!(result.imported.is_empty());
    assert!(result.errors.is_empty());
    assert!(result.warnings.iter().any(|w| w == "No data rows found"));
}

#[tokio::test]
async fn test_autofix_and_typed_persistence() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let env = test_helpers::create_test_env(&db_path, ImportConfig::default()).await;

    let csv = test_helpers::build_valid_csv("Checkout", 2);
    let result = env
        .importer
        .import_bytes(csv.into_bytes(), options("cases.csv"), ProgressReporter::disabled())
        .await;

    assert!(result.success);
    assert_eq!(result.imported.len(), 2);
    assert!(result
        .fixes_applied
        .iter()
        .any(|f| f == "Row 1: Normalized status 'passed' to 'pass'"));

    let stored = env
        .store
        .get_by_id(&result.imported[0].id)
        .await
        .unwrap()
        .expect("stored test case");
    assert_eq!(stored.draft.status, TestStatus::Pass);
    assert_eq!(stored.draft.priority, Priority::High);
    assert_eq!(stored.draft.project_id.as_deref(), Some("proj-1"));
}

#[tokio::test]
async fn test_structured_document_import() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let env = test_helpers::create_test_env(&db_path, ImportConfig::default()).await;

    let json = r#"[
        {"title": "Search by keyword", "description": "Search returns matching items", "expected": "Items listed"},
        {"title": "Search with no results", "description": "Search shows an empty state", "expected": "Empty state"}
    ]"#;
    let result = env
        .importer
        .import_bytes(json.as_bytes().to_vec(), options("cases.json"), ProgressReporter::disabled())
        .await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.imported.len(), 2);
    assert_eq!(result.imported[0].draft.name, "Search by keyword");
}

#[tokio::test]
async fn test_unparseable_document_fails() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let env = test_helpers::create_test_env(&db_path, ImportConfig::default()).await;

    let result = env
        .importer
        .import_bytes(b"{ not json".to_vec(), options("broken.json"), ProgressReporter::disabled())
        .await;

    assert!(!result.success);
    assert!(result.imported.is_empty());
    assert_eq!(result.errors.len(), 1);
}

#[tokio::test]
async fn test_import_file_from_disk() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let env = test_helpers::create_test_env(&db_path, ImportConfig::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = test_helpers::write_file(
        dir.path(),
        "cases.tsv",
        test_helpers::build_valid_csv("Tab", 3).replace(',', "\t").as_bytes(),
    );

    let mut opts = options("ignored");
    opts.file_name = None;
    let result = env
        .importer
        .import_file(&path, opts, ProgressReporter::disabled())
        .await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.imported.len(), 3);
    let session = env
        .history
        .get(result.session_id.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(session.file_name, "cases.tsv");

    let missing = env
        .importer
        .import_file(&dir.path().join("missing.csv"), options("x"), ProgressReporter::disabled())
        .await;
    assert!(!missing.success);
    assert!(missing.errors[0].starts_with("File not found"));
}

#[tokio::test]
async fn test_spreadsheet_import_uses_first_sheet() {
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let env = test_helpers::create_test_env(&db_path, ImportConfig::default()).await;

    let mut workbook = rust_xlsxwriter::Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Regression").unwrap();
        for (col, header) in ["Title", "Description", "Expected", "Test Data", "Priority"]
            .iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        sheet.write_string(1, 0, "Export report").unwrap();
        sheet.write_string(1, 1, "Export the monthly report as PDF").unwrap();
        sheet.write_string(1, 2, "PDF downloaded").unwrap();
        sheet.write_number(1, 3, 1001.0).unwrap();
        sheet.write_string(1, 4, "P1").unwrap();
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Notes").unwrap();
        sheet.write_string(0, 0, "Title").unwrap();
        sheet.write_string(1, 0, "Not a test case").unwrap();
    }
    let bytes = workbook.save_to_buffer().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = test_helpers::write_file(dir.path(), "cases.xlsx", &bytes);
    let mut opts = options("ignored");
    opts.file_name = None;
    let result = env
        .importer
        .import_file(&path, opts, ProgressReporter::disabled())
        .await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.summary.total_rows, 1);
    assert_eq!(result.imported.len(), 1);
    let draft = &result.imported[0].draft;
    assert_eq!(draft.name, "Export report");
    assert_eq!(draft.test_data, "1001");
    assert_eq!(draft.priority, Priority::High);
}
