// ==========================================
// 测试用例导入 - 导入 API
// ==========================================
// 职责: 为一个数据库路径装配存储、历史、回滚与导入编排器
// 调用方: case-import 命令行
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, DuplicateOptions, ImportConfig, ImportConfigReader, ImportOptions};
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::import::{ImportResult, ImportSession, ValidationResult};
use crate::history::{HistoryStore, RollbackManager, RollbackOutcome};
use crate::importer::{ProgressReporter, TestCaseImporter, TestCaseImporterImpl};
use crate::repository::{SqliteHistoryRepository, SqliteTestCaseStore, TestCaseStore};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "CASE_IMPORT_DB_PATH";

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 CASE_IMPORT_DB_PATH（非空时）
/// - 否则: 用户数据目录/case-import/case_import.db
/// - 无法获取用户数据目录时: ./case_import.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./case_import.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("case-import");
        // 目录创建失败时 SQLite 打开会报错，这里不提前中断
        std::fs::create_dir_all(&dir).ok();
        path = dir.join("case_import.db");
    }

    path.to_string_lossy().to_string()
}

// ==========================================
// ImportApi
// ==========================================
pub struct ImportApi {
    db_path: String,
    config_manager: ConfigManager,
    config: ImportConfig,
    store: Arc<SqliteTestCaseStore>,
    history: Arc<HistoryStore>,
    importer: TestCaseImporterImpl,
    rollback: RollbackManager,
}

impl ImportApi {
    /// 打开数据库并装配全部组件（共享同一连接）
    pub async fn open(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(|e| {
            ApiError::DatabaseConnectionError(format!("{}: {}", db_path, e))
        })?;
        init_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        let conn = Arc::new(Mutex::new(conn));

        let config_manager = ConfigManager::from_connection(conn.clone())?;
        let config = config_manager.load_import_config().await?;

        let store = Arc::new(SqliteTestCaseStore::from_connection(conn.clone()));
        let history_repo = Arc::new(SqliteHistoryRepository::from_connection(conn));
        let history = Arc::new(HistoryStore::load(history_repo, config.history_capacity).await?);

        let importer = TestCaseImporterImpl::with_default_components(
            store.clone(),
            Some(store.clone()),
            history.clone(),
            config.clone(),
        );
        let rollback = RollbackManager::new(store.clone(), Some(store.clone()), history.clone());

        info!(db_path = %db_path, history = history.len().await, "导入 API 初始化完成");

        Ok(Self {
            db_path: db_path.to_string(),
            config_manager,
            config,
            store,
            history,
            importer,
            rollback,
        })
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn config_manager(&self) -> &ConfigManager {
        &self.config_manager
    }

    /// 默认导入选项（查重阈值取自配置）
    pub fn default_options(&self) -> ImportOptions {
        ImportOptions {
            duplicate_options: DuplicateOptions {
                similarity_threshold: self.config.similarity_threshold,
                ..DuplicateOptions::default()
            },
            ..ImportOptions::default()
        }
    }

    // ==========================================
    // 导入
    // ==========================================

    pub async fn import_file(
        &self,
        path: &Path,
        options: ImportOptions,
        progress: ProgressReporter,
    ) -> ImportResult {
        self.importer.import_file(path, options, progress).await
    }

    pub async fn import_bytes(
        &self,
        content: Vec<u8>,
        options: ImportOptions,
        progress: ProgressReporter,
    ) -> ImportResult {
        self.importer.import_bytes(content, options, progress).await
    }

    pub async fn batch_import(&self, paths: Vec<PathBuf>, options: ImportOptions) -> Vec<ImportResult> {
        self.importer.batch_import(paths, options).await
    }

    pub fn validation_report(&self, validation: &ValidationResult) -> String {
        self.importer.generate_report(validation)
    }

    /// 项目下的用例总数
    pub async fn count_test_cases(&self, project_id: &str) -> ApiResult<usize> {
        Ok(self.store.count_by_project(project_id).await?)
    }

    // ==========================================
    // 历史与回滚
    // ==========================================

    pub async fn list_history(&self) -> Vec<ImportSession> {
        self.history.list().await
    }

    pub async fn get_session(&self, session_id: &str) -> ApiResult<ImportSession> {
        self.history
            .get(session_id)
            .await
            .ok_or_else(|| ApiError::NotFound(format!("import session {}", session_id)))
    }

    pub async fn rollback(&self, session_id: &str) -> ApiResult<RollbackOutcome> {
        Ok(self.rollback.rollback(session_id).await?)
    }

    pub async fn delete_session(&self, session_id: &str) -> ApiResult<()> {
        if self.history.delete(session_id).await? {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("import session {}", session_id)))
        }
    }

    pub async fn clear_history(&self) -> ApiResult<usize> {
        Ok(self.history.clear().await?)
    }

    pub async fn export_history(&self) -> ApiResult<String> {
        Ok(self.history.export_json().await?)
    }

    pub async fn import_history(&self, json: &str) -> ApiResult<usize> {
        Ok(self.history.import_json(json).await?)
    }
}
