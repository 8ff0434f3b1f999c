// ==========================================
// 测试用例导入 - 导入编排器实现
// ==========================================
// 职责: 整合导入流程，从文件到存储，并记录导入会话
// 流程: 读取 → 解析 → 映射/修复/校验 → 查重 → 处理 → 落库 → 完成
// 红线: 整体失败折叠为 success=false 的 ImportResult，不保留部分状态
// ==========================================

use crate::config::{ImportConfig, ImportOptions};
use crate::domain::import::{
    DuplicateReport, ImportResult, ImportSession, ImportSummary, ParseOptions, RollbackSnapshot,
    SessionSummary, SkippedRow, ValidationIssue, ValidationResult,
};
use crate::domain::test_case::{CandidateRecord, ContainerStats, TestCase, TestCaseDraft};
use crate::domain::types::{FileFormat, ImportStage, ResolutionStrategy, SessionStatus};
use crate::history::HistoryStore;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::dq_validator::DqValidator;
use crate::importer::duplicate_detector::{resolve_group, FuzzyDuplicateDetector};
use crate::importer::error::ImportError;
use crate::importer::field_mapper::SynonymFieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::importer_trait::{
    AutoFixer, DuplicateDetector, FieldMapper, FileParser, RecordValidator, TestCaseImporter,
};
use crate::importer::progress::ProgressReporter;
use crate::repository::test_case_repo::{StatsStore, TestCaseStore};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// PipelineRun - 一次成功走完管道的中间结果
// ==========================================
struct PipelineRun {
    success: bool,
    format: Option<FileFormat>,
    total_rows: usize,
    imported: Vec<TestCase>,
    skipped: Vec<SkippedRow>,
    errors: Vec<String>,
    warnings: Vec<String>,
    fixes_applied: Vec<String>,
    duplicates: Option<DuplicateReport>,
    validation: Option<ValidationResult>,
    prior_stats: Option<ContainerStats>,
}

// ==========================================
// TestCaseImporterImpl - 测试用例导入编排器
// ==========================================
pub struct TestCaseImporterImpl {
    // 存储协作方
    store: Arc<dyn TestCaseStore>,
    stats: Option<Arc<dyn StatsStore>>,

    // 导入历史
    history: Arc<HistoryStore>,

    // 可调常量
    config: ImportConfig,

    // 管道组件
    file_parser: Box<dyn FileParser>,
    field_mapper: Box<dyn FieldMapper>,
    auto_fixer: Box<dyn AutoFixer>,
    validator: Box<dyn RecordValidator>,
    duplicate_detector: Box<dyn DuplicateDetector>,
}

impl TestCaseImporterImpl {
    /// 创建导入编排器
    ///
    /// # 参数
    /// - store: 测试用例存储
    /// - stats: 容器统计存储（可选，存在时导入前捕获快照）
    /// - history: 导入历史
    /// - config: 可调常量
    /// - 其余: 各阶段组件
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn TestCaseStore>,
        stats: Option<Arc<dyn StatsStore>>,
        history: Arc<HistoryStore>,
        config: ImportConfig,
        file_parser: Box<dyn FileParser>,
        field_mapper: Box<dyn FieldMapper>,
        auto_fixer: Box<dyn AutoFixer>,
        validator: Box<dyn RecordValidator>,
        duplicate_detector: Box<dyn DuplicateDetector>,
    ) -> Self {
        Self {
            store,
            stats,
            history,
            config,
            file_parser,
            field_mapper,
            auto_fixer,
            validator,
            duplicate_detector,
        }
    }

    /// 使用默认组件创建
    pub fn with_default_components(
        store: Arc<dyn TestCaseStore>,
        stats: Option<Arc<dyn StatsStore>>,
        history: Arc<HistoryStore>,
        config: ImportConfig,
    ) -> Self {
        let min_description_length = config.min_description_length;
        Self::new(
            store,
            stats,
            history,
            config,
            Box::new(UniversalFileParser),
            Box::new(SynonymFieldMapper),
            Box::new(DataCleaner),
            Box::new(DqValidator::new(min_description_length)),
            Box::new(FuzzyDuplicateDetector),
        )
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// 校验报告（纯文本）
    pub fn generate_report(&self, validation: &ValidationResult) -> String {
        self.validator.generate_report(validation)
    }

    // ==========================================
    // 管道主体
    // ==========================================
    async fn run_pipeline(
        &self,
        content: &[u8],
        options: &ImportOptions,
        progress: &ProgressReporter,
    ) -> Result<PipelineRun, ImportError> {
        let mut warnings = Vec::new();

        // === 步骤 1: 读取（大小校验）===
        debug!("步骤 1: 读取");
        let file_size = content.len() as u64;
        progress.report(ImportStage::Reading, 0, 0, "Reading file");
        self.check_size(file_size, &mut warnings)?;

        // === 步骤 2: 解析 ===
        debug!("步骤 2: 解析文件");
        progress.report(ImportStage::Parsing, 0, 0, "Parsing file");
        let parse_options = ParseOptions {
            file_name: options.file_name.clone(),
            format: options.format,
            delimiter: options.delimiter,
            empty_row_warn_ratio: self.config.empty_row_warn_ratio,
        };
        let parsed = self.file_parser.parse(content, &parse_options);
        if parsed.is_fatal() {
            error!(errors = ?parsed.errors, "文件解析失败");
            return Err(ImportError::ParseError(parsed.errors.join("; ")));
        }
        warnings.extend(parsed.warnings);
        let format = Some(parsed.meta.format);
        let total_rows = parsed.rows.len();
        info!(total_rows = total_rows, format = %parsed.meta.format, "文件解析完成");

        // === 步骤 3: 映射 / 修复 / 校验 ===
        debug!("步骤 3: 字段映射与校验");
        progress.report(ImportStage::Validating, 0, total_rows, "Validating records");
        let mut records: Vec<CandidateRecord> = parsed
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                self.field_mapper.map(
                    row,
                    idx + 1,
                    options.project_id.as_deref(),
                    options.suite_id.as_deref(),
                )
            })
            .collect();

        let fixes_applied = if options.auto_fix {
            self.auto_fixer
                .apply_fixes(&mut records, options.generate_missing_fields)
        } else {
            Vec::new()
        };
        if !fixes_applied.is_empty() {
            info!(fixes = fixes_applied.len(), "自动修复完成");
        }

        let validation = self.validator.validate(&records);
        let errors: Vec<String> = validation.errors.iter().map(issue_line).collect();
        warnings.extend(validation.warnings.iter().map(issue_line));
        info!(
            errors = validation.errors.len(),
            warnings = validation.warnings.len(),
            "数据校验完成"
        );

        // === 步骤 4: 查重 ===
        debug!("步骤 4: 重复检测");
        progress.report(
            ImportStage::DetectingDuplicates,
            0,
            records.len(),
            "Detecting duplicates",
        );
        let mut skipped = Vec::new();
        let duplicates = if options.detect_duplicates {
            let report = self
                .duplicate_detector
                .detect(&records, &options.duplicate_options);
            if !report.duplicate_groups.is_empty() {
                warnings.push(format!(
                    "Found {} duplicate group(s) covering {} duplicate record(s)",
                    report.duplicate_groups.len(),
                    report.total_duplicates
                ));
            }
            if let Some(strategy) = options.duplicate_strategy {
                records = apply_strategy(records, &report, strategy, &validation, &mut skipped);
            }
            Some(report)
        } else {
            None
        };

        // === 步骤 5: 处理 ===
        debug!("步骤 5: 处理记录");
        progress.report(ImportStage::Processing, 0, records.len(), "Processing records");
        if options.strict_mode && !validation.errors.is_empty() {
            warn!(errors = validation.errors.len(), "严格模式下存在校验错误，放弃导入");
            return Ok(PipelineRun {
                success: false,
                format,
                total_rows,
                imported: Vec::new(),
                skipped,
                errors,
                warnings,
                fixes_applied,
                duplicates,
                validation: Some(validation),
                prior_stats: None,
            });
        }

        let mut drafts = Vec::with_capacity(records.len());
        for record in &records {
            if validation.row_has_errors(record.row_index) {
                skipped.push(SkippedRow {
                    row_index: record.row_index,
                    name: record.name.clone(),
                    reason: row_error_reason(&validation, record.row_index),
                });
                continue;
            }
            match TestCaseDraft::from_candidate(record) {
                Ok(draft) => drafts.push(draft),
                Err(reason) => skipped.push(SkippedRow {
                    row_index: record.row_index,
                    name: record.name.clone(),
                    reason,
                }),
            }
        }
        skipped.sort_by_key(|s| s.row_index);

        // === 步骤 6: 落库 ===
        debug!("步骤 6: 落库");
        progress.report(ImportStage::Saving, 0, drafts.len(), "Saving test cases");
        let (imported, prior_stats) = self.save(drafts, options).await?;

        progress.report(
            ImportStage::Complete,
            imported.len(),
            total_rows,
            format!("Imported {} test case(s)", imported.len()),
        );

        Ok(PipelineRun {
            success: true,
            format,
            total_rows,
            imported,
            skipped,
            errors,
            warnings,
            fixes_applied,
            duplicates,
            validation: Some(validation),
            prior_stats,
        })
    }

    fn check_size(&self, file_size: u64, warnings: &mut Vec<String>) -> Result<(), ImportError> {
        if file_size > self.config.max_file_size_bytes {
            return Err(ImportError::FileTooLarge {
                size: file_size,
                limit: self.config.max_file_size_bytes,
            });
        }
        if file_size > self.config.soft_size_warning_bytes {
            warnings.push(format!(
                "File is {} bytes, larger than {} bytes; import may be slow",
                file_size, self.config.soft_size_warning_bytes
            ));
        }
        Ok(())
    }

    /// 分块落库，任一块失败则删除已创建的记录
    async fn save(
        &self,
        drafts: Vec<TestCaseDraft>,
        options: &ImportOptions,
    ) -> Result<(Vec<TestCase>, Option<ContainerStats>), ImportError> {
        if drafts.is_empty() {
            return Ok((Vec::new(), None));
        }

        // 导入前统计快照
        let stats_target = match (&self.stats, options.project_id.as_deref()) {
            (Some(stats), Some(project_id)) => Some((stats, project_id)),
            _ => None,
        };
        let prior_stats = match stats_target {
            Some((stats, project_id)) => Some(
                stats
                    .get_stats(project_id)
                    .await?
                    .unwrap_or_else(|| ContainerStats::empty(project_id)),
            ),
            None => None,
        };

        let batch_size = options.batch_size.unwrap_or(self.config.batch_size).max(1);
        let mut imported: Vec<TestCase> = Vec::with_capacity(drafts.len());

        for (chunk_idx, chunk) in drafts.chunks(batch_size).enumerate() {
            match self.store.create_many(chunk.to_vec()).await {
                Ok(created) => {
                    debug!(chunk = chunk_idx, created = created.len(), "分块落库完成");
                    imported.extend(created);
                }
                Err(e) => {
                    error!(chunk = chunk_idx, error = %e, "分块落库失败");
                    self.compensate(&imported).await;
                    return Err(ImportError::StoreError(e.to_string()));
                }
            }
        }

        if let Some((stats, project_id)) = stats_target {
            if let Err(e) = stats.apply_import(project_id, imported.len()).await {
                error!(project_id = %project_id, error = %e, "统计更新失败");
                self.compensate(&imported).await;
                return Err(ImportError::StoreError(e.to_string()));
            }
        }

        Ok((imported, prior_stats))
    }

    /// 补偿删除（尽力而为）
    async fn compensate(&self, created: &[TestCase]) {
        if created.is_empty() {
            return;
        }
        let ids: Vec<String> = created.iter().map(|c| c.id.clone()).collect();
        match self.store.delete_many(&ids).await {
            Ok(deleted) => warn!(deleted = deleted, "已删除本次导入的部分记录"),
            Err(e) => error!(error = %e, remaining = ids.len(), "补偿删除失败"),
        }
    }

    /// 记录会话，失败只告警
    async fn record_session(&self, session: ImportSession, result: &mut ImportResult) {
        let session_id = session.session_id.clone();
        match self.history.record(session).await {
            Ok(()) => result.session_id = Some(session_id),
            Err(e) => {
                error!(session_id = %session_id, error = %e, "导入会话记录失败");
                result
                    .warnings
                    .push(ImportError::HistoryError(e.to_string()).to_string());
                result.summary.warning_count = result.warnings.len();
            }
        }
    }

    /// 整体失败：折叠为失败结果并记录 failed 会话
    async fn fail(
        &self,
        err: ImportError,
        options: &ImportOptions,
        file_size: u64,
        started: Instant,
        progress: &ProgressReporter,
    ) -> ImportResult {
        let message = err.to_string();
        error!(error = %message, "导入失败");
        progress.report(ImportStage::Failed, 0, 0, message.clone());

        let mut result = ImportResult::failure(message.clone(), elapsed_ms(started));
        let session = ImportSession {
            session_id: Uuid::new_v4().to_string(),
            file_name: display_name(options),
            file_size,
            file_type: None,
            project_id: options.project_id.clone(),
            suite_id: options.suite_id.clone(),
            created_at: Utc::now(),
            summary: SessionSummary {
                errors: 1,
                ..SessionSummary::default()
            },
            errors: vec![message],
            warnings: Vec::new(),
            imported_test_case_ids: Vec::new(),
            snapshot: None,
            status: SessionStatus::Failed,
            rolled_back_at: None,
        };
        self.record_session(session, &mut result).await;
        result
    }
}

#[async_trait]
impl TestCaseImporter for TestCaseImporterImpl {
    #[instrument(skip(self, content, options, progress), fields(file_name = ?options.file_name, size = content.len()))]
    async fn import_bytes(
        &self,
        content: Vec<u8>,
        options: ImportOptions,
        progress: ProgressReporter,
    ) -> ImportResult {
        let started = Instant::now();
        let file_size = content.len() as u64;
        info!(project_id = ?options.project_id, strict = options.strict_mode, "开始导入测试用例");

        let run = match self.run_pipeline(&content, &options, &progress).await {
            Ok(run) => run,
            Err(e) => return self.fail(e, &options, file_size, started, &progress).await,
        };

        let imported_ids: Vec<String> = run.imported.iter().map(|c| c.id.clone()).collect();
        let status = if !run.success {
            SessionStatus::Failed
        } else if run.skipped.is_empty() {
            SessionStatus::Completed
        } else {
            SessionStatus::Partial
        };
        let snapshot = if imported_ids.is_empty() {
            None
        } else {
            Some(RollbackSnapshot {
                created_ids: imported_ids.clone(),
                prior_stats: run.prior_stats.clone(),
                captured_at: Utc::now(),
            })
        };

        let summary = ImportSummary {
            total_rows: run.total_rows,
            successful_imports: run.imported.len(),
            skipped_rows: run.skipped.len(),
            error_count: run.errors.len(),
            warning_count: run.warnings.len(),
            processing_time_ms: elapsed_ms(started),
        };

        let session = ImportSession {
            session_id: Uuid::new_v4().to_string(),
            file_name: display_name(&options),
            file_size,
            file_type: run.format,
            project_id: options.project_id.clone(),
            suite_id: options.suite_id.clone(),
            created_at: Utc::now(),
            summary: SessionSummary {
                total_rows: run.total_rows,
                imported: run.imported.len(),
                skipped: run.skipped.len(),
                errors: run.errors.len(),
                warnings: run.warnings.len(),
                duplicates: run.duplicates.as_ref().map_or(0, |d| d.total_duplicates),
                fixes: run.fixes_applied.len(),
            },
            errors: run.errors.clone(),
            warnings: run.warnings.clone(),
            imported_test_case_ids: imported_ids,
            snapshot,
            status,
            rolled_back_at: None,
        };

        let mut result = ImportResult {
            success: run.success,
            imported: run.imported,
            skipped: run.skipped,
            errors: run.errors,
            warnings: run.warnings,
            duplicates: run.duplicates,
            validation: run.validation,
            fixes_applied: run.fixes_applied,
            summary,
            session_id: None,
        };

        self.record_session(session, &mut result).await;

        info!(
            success = result.success,
            imported = result.summary.successful_imports,
            skipped = result.summary.skipped_rows,
            elapsed_ms = result.summary.processing_time_ms,
            "导入完成"
        );
        result
    }

    async fn import_file(
        &self,
        file_path: &Path,
        mut options: ImportOptions,
        progress: ProgressReporter,
    ) -> ImportResult {
        let started = Instant::now();
        if options.file_name.is_none() {
            options.file_name = file_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned());
        }

        // 先看元数据，超限文件不读入内存
        let metadata = match tokio::fs::metadata(file_path).await {
            Ok(metadata) => metadata,
            Err(e) => return self.fail(e.into(), &options, 0, started, &progress).await,
        };
        if metadata.len() > self.config.max_file_size_bytes {
            let err = ImportError::FileTooLarge {
                size: metadata.len(),
                limit: self.config.max_file_size_bytes,
            };
            return self
                .fail(err, &options, metadata.len(), started, &progress)
                .await;
        }

        match tokio::fs::read(file_path).await {
            Ok(content) => self.import_bytes(content, options, progress).await,
            Err(e) => {
                self.fail(e.into(), &options, metadata.len(), started, &progress)
                    .await
            }
        }
    }

    async fn batch_import(&self, file_paths: Vec<PathBuf>, options: ImportOptions) -> Vec<ImportResult> {
        info!(files = file_paths.len(), "开始批量导入");

        let futures = file_paths.iter().map(|path| {
            let mut file_options = options.clone();
            file_options.file_name = None;
            self.import_file(path, file_options, ProgressReporter::disabled())
        });

        let results = join_all(futures).await;

        let succeeded = results.iter().filter(|r| r.success).count();
        info!(files = results.len(), succeeded = succeeded, "批量导入完成");
        results
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 按策略处理重复组，被舍弃的记录进入 skipped
///
/// 保留的记录必须能落库: 策略选中的记录存在校验错误时改保留组内首条（keep_last 为末条）
/// 无错误的成员；全组都有错误时不处理该组，各行按自身校验结果跳过
fn apply_strategy(
    records: Vec<CandidateRecord>,
    report: &DuplicateReport,
    strategy: ResolutionStrategy,
    validation: &ValidationResult,
    skipped: &mut Vec<SkippedRow>,
) -> Vec<CandidateRecord> {
    let mut replacements: HashMap<usize, CandidateRecord> = HashMap::new();
    let mut dropped: HashSet<usize> = HashSet::new();

    for group in &report.duplicate_groups {
        let clean: Vec<&CandidateRecord> = group
            .members()
            .filter(|m| !validation.row_has_errors(m.row_index))
            .collect();
        if clean.is_empty() {
            debug!(row = group.original.row_index, "重复组全部存在校验错误，不按策略处理");
            continue;
        }

        let mut kept = resolve_group(group, strategy);
        if kept.iter().any(|r| validation.row_has_errors(r.row_index)) {
            let fallback = match strategy {
                ResolutionStrategy::KeepLast => clean[clean.len() - 1],
                _ => clean[0],
            };
            kept = vec![fallback.clone()];
        }
        let kept_rows: HashSet<usize> = kept.iter().map(|r| r.row_index).collect();
        let kept_row = kept.first().map(|r| r.row_index);

        for member in group.members() {
            if kept_rows.contains(&member.row_index) {
                continue;
            }
            // 有错误的成员按校验结果跳过，不归为重复
            if validation.row_has_errors(member.row_index) {
                continue;
            }
            dropped.insert(member.row_index);
            skipped.push(SkippedRow {
                row_index: member.row_index,
                name: member.name.clone(),
                reason: match kept_row {
                    Some(row) => format!("Duplicate of row {}", row),
                    None => "Duplicate group skipped".to_string(),
                },
            });
        }
        for record in kept {
            replacements.insert(record.row_index, record);
        }
    }

    debug!(strategy = ?strategy, dropped = dropped.len(), "重复组已按策略处理");

    records
        .into_iter()
        .filter(|r| !dropped.contains(&r.row_index))
        .map(|r| replacements.remove(&r.row_index).unwrap_or(r))
        .collect()
}

fn issue_line(issue: &ValidationIssue) -> String {
    format!("Row {}, field {}: {}", issue.row_index, issue.field, issue.message)
}

fn row_error_reason(validation: &ValidationResult, row_index: usize) -> String {
    let messages: Vec<&str> = validation
        .errors
        .iter()
        .filter(|i| i.row_index == row_index)
        .map(|i| i.message.as_str())
        .collect();
    format!("Validation failed: {}", messages.join("; "))
}

fn display_name(options: &ImportOptions) -> String {
    options
        .file_name
        .clone()
        .unwrap_or_else(|| "unnamed".to_string())
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::history_repo_impl::SqliteHistoryRepository;
    use crate::repository::test_case_repo_impl::SqliteTestCaseStore;
    use tempfile::NamedTempFile;

    struct Fixture {
        _db: NamedTempFile,
        store: Arc<SqliteTestCaseStore>,
        history: Arc<HistoryStore>,
        importer: TestCaseImporterImpl,
    }

    async fn fixture(config: ImportConfig) -> Fixture {
        let db = NamedTempFile::new().unwrap();
        let path = db.path().to_str().unwrap().to_string();
        let store = Arc::new(SqliteTestCaseStore::new(&path).unwrap());
        let repo = Arc::new(SqliteHistoryRepository::new(&path).unwrap());
        let history = Arc::new(HistoryStore::load(repo, 10).await.unwrap());
        let importer = TestCaseImporterImpl::with_default_components(
            store.clone(),
            Some(store.clone()),
            history.clone(),
            config,
        );
        Fixture {
            _db: db,
            store,
            history,
            importer,
        }
    }

    fn csv_options() -> ImportOptions {
        ImportOptions {
            file_name: Some("cases.csv".to_string()),
            project_id: Some("p1".to_string()),
            ..ImportOptions::default()
        }
    }

    #[tokio::test]
    async fn test_progress_checkpoints_monotonic() {
        let fx = fixture(ImportConfig::default()).await;
        let csv = "Name,Description,Expected Result\nLogin,Open the login page,Page shown\n";
        let (reporter, mut rx) = ProgressReporter::channel();

        let result = fx
            .importer
            .import_bytes(csv.as_bytes().to_vec(), csv_options(), reporter)
            .await;
        assert!(result.success);

        let mut percents = Vec::new();
        while let Ok(event) = rx.try_recv() {
            percents.push(event.percent);
        }
        assert_eq!(percents, vec![0, 10, 30, 50, 70, 90, 100]);
    }

    #[tokio::test]
    async fn test_oversized_content_fails() {
        let config = ImportConfig {
            max_file_size_bytes: 16,
            soft_size_warning_bytes: 8,
            ..ImportConfig::default()
        };
        let fx = fixture(config).await;
        let csv = "Name\nA very long test case name\n";

        let result = fx
            .importer
            .import_bytes(csv.as_bytes().to_vec(), csv_options(), ProgressReporter::disabled())
            .await;
        assert!(!result.success);
        assert!(result.imported.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("too large"));

        // 失败的运行同样记录
        let session = fx.history.get(result.session_id.as_deref().unwrap()).await.unwrap();
        assert_eq!(session.status, SessionStatus::Failed);
        assert!(!session.can_rollback());
    }

    #[tokio::test]
    async fn test_soft_size_warning() {
        let config = ImportConfig {
            soft_size_warning_bytes: 8,
            ..ImportConfig::default()
        };
        let fx = fixture(config).await;
        let csv = "Name\nLogin works\n";

        let result = fx
            .importer
            .import_bytes(csv.as_bytes().to_vec(), csv_options(), ProgressReporter::disabled())
            .await;
        assert!(result.success);
        assert!(result.warnings.iter().any(|w| w.contains("import may be slow")));
    }

    #[tokio::test]
    async fn test_non_strict_skips_error_rows() {
        let fx = fixture(ImportConfig::default()).await;
        let csv = "Name,Priority\nLogin,high\n,low\nLogout,whenever\n";

        let result = fx
            .importer
            .import_bytes(csv.as_bytes().to_vec(), csv_options(), ProgressReporter::disabled())
            .await;
        assert!(result.success);
        assert_eq!(result.imported.len(), 1);
        assert_eq!(result.imported[0].draft.name, "Login");

        let skipped_rows: Vec<usize> = result.skipped.iter().map(|s| s.row_index).collect();
        assert_eq!(skipped_rows, vec![2, 3]);
        assert!(result.skipped[0].reason.starts_with("Validation failed"));
        assert_eq!(fx.store.count_by_project("p1").await.unwrap(), 1);

        let session = fx.history.get(result.session_id.as_deref().unwrap()).await.unwrap();
        assert_eq!(session.status, SessionStatus::Partial);
        assert!(session.can_rollback());
    }

    #[tokio::test]
    async fn test_duplicate_strategy_keep_first() {
        let fx = fixture(ImportConfig::default()).await;
        let csv = "Name,Description\nTC001,X\nTC002,Y\nTC001,X\n";
        let options = ImportOptions {
            duplicate_strategy: Some(ResolutionStrategy::KeepFirst),
            ..csv_options()
        };

        let result = fx
            .importer
            .import_bytes(csv.as_bytes().to_vec(), options, ProgressReporter::disabled())
            .await;
        assert!(result.success);
        assert_eq!(result.imported.len(), 2);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].row_index, 3);
        assert_eq!(result.skipped[0].reason, "Duplicate of row 1");
    }

    #[tokio::test]
    async fn test_generate_missing_fields_backfills_blank_columns() {
        let csv = "Name,Status,Priority,Category\nLogin,,,\n";

        let fx = fixture(ImportConfig::default()).await;
        let without = fx
            .importer
            .import_bytes(csv.as_bytes().to_vec(), csv_options(), ProgressReporter::disabled())
            .await;
        assert!(without.success);
        assert!(without.imported.is_empty());
        assert!(without.fixes_applied.is_empty());
        assert_eq!(without.errors.len(), 3);
        assert!(without.errors.iter().any(|e| e.starts_with("Row 1, field status:")));

        let fx = fixture(ImportConfig::default()).await;
        let options = ImportOptions {
            generate_missing_fields: true,
            ..csv_options()
        };
        let with = fx
            .importer
            .import_bytes(csv.as_bytes().to_vec(), options, ProgressReporter::disabled())
            .await;
        assert!(with.success);
        assert!(with.errors.is_empty());
        assert_eq!(with.imported.len(), 1);
        assert_eq!(
            with.fixes_applied,
            vec![
                "Row 1: Set missing status to 'not_run'".to_string(),
                "Row 1: Set missing priority to 'medium'".to_string(),
                "Row 1: Set missing category to 'functional'".to_string(),
            ]
        );
        assert_eq!(with.imported[0].draft.status, crate::domain::types::TestStatus::NotRun);
    }

    #[tokio::test]
    async fn test_blank_names_are_not_duplicates() {
        let fx = fixture(ImportConfig::default()).await;
        let csv = "Name,Description\n,Open the login page\n,Open the settings page\n";
        let options = ImportOptions {
            duplicate_strategy: Some(ResolutionStrategy::KeepFirst),
            ..csv_options()
        };

        let result = fx
            .importer
            .import_bytes(csv.as_bytes().to_vec(), options, ProgressReporter::disabled())
            .await;
        assert!(result.success);
        assert!(result.imported.is_empty());
        assert!(result.duplicates.unwrap().duplicate_groups.is_empty());

        let reasons: Vec<(usize, &str)> = result
            .skipped
            .iter()
            .map(|s| (s.row_index, s.reason.as_str()))
            .collect();
        assert_eq!(
            reasons,
            vec![
                (1, "Validation failed: Name is required"),
                (2, "Validation failed: Name is required"),
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_strategy_keeps_valid_member() {
        let fx = fixture(ImportConfig::default()).await;
        let csv = "Name,Priority\nLogin,whenever\nLogin,high\nLogin,low\n";
        let options = ImportOptions {
            duplicate_strategy: Some(ResolutionStrategy::KeepFirst),
            ..csv_options()
        };

        let result = fx
            .importer
            .import_bytes(csv.as_bytes().to_vec(), options, ProgressReporter::disabled())
            .await;
        assert!(result.success);
        assert_eq!(result.imported.len(), 1);
        assert_eq!(result.imported[0].draft.priority, crate::domain::types::Priority::High);

        assert_eq!(result.skipped.len(), 2);
        assert_eq!(result.skipped[0].row_index, 1);
        assert!(result.skipped[0].reason.starts_with("Validation failed"));
        assert_eq!(result.skipped[1].row_index, 3);
        assert_eq!(result.skipped[1].reason, "Duplicate of row 2");
    }

    #[tokio::test]
    async fn test_stats_snapshot_captured() {
        let fx = fixture(ImportConfig::default()).await;
        let csv = "Name\nA\nB\n";

        let result = fx
            .importer
            .import_bytes(csv.as_bytes().to_vec(), csv_options(), ProgressReporter::disabled())
            .await;
        assert!(result.success);

        let stats = fx.store.get_stats("p1").await.unwrap().unwrap();
        assert_eq!(stats.total_cases, 2);

        let session = fx.history.get(result.session_id.as_deref().unwrap()).await.unwrap();
        let snapshot = session.snapshot.unwrap();
        assert_eq!(snapshot.created_ids.len(), 2);
        assert_eq!(snapshot.prior_stats.unwrap().total_cases, 0);
    }

    #[tokio::test]
    async fn test_imported_cases_match_stored_rows() {
        let fx = fixture(ImportConfig::default()).await;
        let csv = "Name\nA\nB\nC\n";
        let options = ImportOptions {
            batch_size: Some(2),
            ..csv_options()
        };

        let result = fx
            .importer
            .import_bytes(csv.as_bytes().to_vec(), options, ProgressReporter::disabled())
            .await;
        assert!(result.success);
        assert_eq!(result.imported.len(), 3);
        for case in &result.imported {
            let stored = fx.store.get_by_id(&case.id).await.unwrap().unwrap();
            assert_eq!(&stored, case);
        }
    }

    #[test]
    fn test_issue_line_format() {
        let issue = ValidationIssue {
            row_index: 4,
            field: "name".to_string(),
            value: String::new(),
            message: "Test case name is required".to_string(),
            severity: crate::domain::types::Severity::Error,
            suggestions: Vec::new(),
        };
        assert_eq!(issue_line(&issue), "Row 4, field name: Test case name is required");
    }
}
