// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、导入器装配、测试文件生成等功能
// ==========================================
#![allow(dead_code)]

use case_import::config::ImportConfig;
use case_import::history::HistoryStore;
use case_import::importer::TestCaseImporterImpl;
use case_import::repository::{SqliteHistoryRepository, SqliteTestCaseStore};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = case_import::db::open_sqlite_connection(&db_path)?;
    case_import::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 测试用导入环境
pub struct TestEnv {
    pub store: Arc<SqliteTestCaseStore>,
    pub history: Arc<HistoryStore>,
    pub importer: TestCaseImporterImpl,
}

/// 装配导入器（默认组件，统计存储与用例存储为同一实例）
pub async fn create_test_env(db_path: &str, config: ImportConfig) -> TestEnv {
    let store = Arc::new(SqliteTestCaseStore::new(db_path).expect("Failed to create store"));
    let history_repo =
        Arc::new(SqliteHistoryRepository::new(db_path).expect("Failed to create history repo"));
    let history = Arc::new(
        HistoryStore::load(history_repo, config.history_capacity)
            .await
            .expect("Failed to load history"),
    );
    let importer = TestCaseImporterImpl::with_default_components(
        store.clone(),
        Some(store.clone()),
        history.clone(),
        config,
    );

    TestEnv {
        store,
        history,
        importer,
    }
}

/// 生成 CSV 内容
///
/// # 参数
/// - headers: 表头
/// - rows: 数据行（每行单元格）
pub fn build_csv(headers: &[&str], rows: &[Vec<&str>]) -> String {
    let mut out = headers.join(",");
    out.push('\n');
    for row in rows {
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// 生成 n 条合法用例的 CSV
pub fn build_valid_csv(prefix: &str, count: usize) -> String {
    let mut out = String::from("Name,Description,Expected Result,Priority,Status\n");
    for i in 1..=count {
        out.push_str(&format!(
            "{} case {},Verify behaviour number {} end to end,Works as documented,high,passed\n",
            prefix, i, i
        ));
    }
    out
}

/// 在目录中写入测试文件
pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}
