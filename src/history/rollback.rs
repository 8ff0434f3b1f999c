// ==========================================
// 测试用例导入 - 回滚管理器
// ==========================================
// 流程: 删除会话记录的全部用例 ID -> 回退统计（若有快照）-> 标记 rolled_back
// 统计: 从当前值扣除本次导入的贡献；之后没有其他导入时结果即导入前快照
// 红线: 两步都成功后才修改会话状态；删除失败与统计恢复失败分别报告
// 并发: 回滚操作之间串行
// ==========================================

use crate::domain::test_case::ContainerStats;
use crate::domain::types::SessionStatus;
use crate::history::history_store::HistoryStore;
use crate::repository::error::RepositoryError;
use crate::repository::test_case_repo::{StatsStore, TestCaseStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

// ==========================================
// RollbackError
// ==========================================
#[derive(Error, Debug)]
pub enum RollbackError {
    #[error("Import session not found: {0}")]
    SessionNotFound(String),

    #[error("Import session {0} cannot be rolled back: {1}")]
    NotReversible(String, String),

    #[error("Import session {0} has already been rolled back")]
    AlreadyRolledBack(String),

    #[error("Failed to delete imported test cases: {0}")]
    DeleteFailed(RepositoryError),

    #[error("Test cases were deleted but statistics could not be restored: {0}")]
    StatsRestoreFailed(RepositoryError),

    #[error("History update failed: {0}")]
    History(RepositoryError),
}

/// 回滚结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackOutcome {
    pub session_id: String,
    pub deleted: usize,
    pub stats_restored: bool,
    pub rolled_back_at: DateTime<Utc>,
}

pub struct RollbackManager {
    store: Arc<dyn TestCaseStore>,
    stats: Option<Arc<dyn StatsStore>>,
    history: Arc<HistoryStore>,
    rollback_lock: Mutex<()>,
}

impl RollbackManager {
    pub fn new(
        store: Arc<dyn TestCaseStore>,
        stats: Option<Arc<dyn StatsStore>>,
        history: Arc<HistoryStore>,
    ) -> Self {
        Self {
            store,
            stats,
            history,
            rollback_lock: Mutex::new(()),
        }
    }

    /// 会话是否可回滚（存在、未回滚、有导入记录且有快照）
    pub async fn can_rollback(&self, session_id: &str) -> bool {
        match self.history.get(session_id).await {
            Some(session) => {
                session.can_rollback() && session.status.can_transition_to(SessionStatus::RolledBack)
            }
            None => false,
        }
    }

    /// 回滚一次导入
    #[instrument(skip(self))]
    pub async fn rollback(&self, session_id: &str) -> Result<RollbackOutcome, RollbackError> {
        let _guard = self.rollback_lock.lock().await;

        let session = self
            .history
            .get(session_id)
            .await
            .ok_or_else(|| RollbackError::SessionNotFound(session_id.to_string()))?;

        if session.status == SessionStatus::RolledBack {
            return Err(RollbackError::AlreadyRolledBack(session_id.to_string()));
        }
        if !session.status.can_transition_to(SessionStatus::RolledBack) {
            return Err(RollbackError::NotReversible(
                session_id.to_string(),
                format!("session status is {}", session.status),
            ));
        }
        let Some(snapshot) = session.snapshot.as_ref().filter(|_| session.can_rollback()) else {
            return Err(RollbackError::NotReversible(
                session_id.to_string(),
                "no imported test cases or rollback snapshot".to_string(),
            ));
        };

        // 步骤 1: 删除本次导入创建的记录
        let ids = &session.imported_test_case_ids;
        let deleted = self.store.delete_many(ids).await.map_err(|e| {
            error!(session_id = %session_id, error = %e, "回滚删除失败");
            RollbackError::DeleteFailed(e)
        })?;
        if deleted != ids.len() {
            warn!(
                session_id = %session_id,
                expected = ids.len(),
                deleted = deleted,
                "部分记录已不存在"
            );
        }

        // 步骤 2: 回退统计
        let mut stats_restored = false;
        if let (Some(stats_store), Some(prior)) = (&self.stats, &snapshot.prior_stats) {
            let restore = async {
                let current = stats_store.get_stats(&prior.container_id).await?;
                let target = compensated_stats(prior, current.as_ref(), snapshot.created_ids.len());
                stats_store.restore_stats(&target).await
            };
            restore.await.map_err(|e| {
                error!(session_id = %session_id, error = %e, "回滚统计恢复失败");
                RollbackError::StatsRestoreFailed(e)
            })?;
            stats_restored = true;
        }

        // 步骤 3: 标记会话
        let rolled_back_at = Utc::now();
        self.history
            .update_status(session_id, SessionStatus::RolledBack, Some(rolled_back_at))
            .await
            .map_err(RollbackError::History)?
            .ok_or_else(|| RollbackError::SessionNotFound(session_id.to_string()))?;

        info!(session_id = %session_id, deleted = deleted, stats_restored, "导入已回滚");

        Ok(RollbackOutcome {
            session_id: session_id.to_string(),
            deleted,
            stats_restored,
            rolled_back_at,
        })
    }
}

/// 扣除一次导入贡献后的统计
///
/// 当前统计缺失时退回快照；导入后又有其他导入时保留其计数与最近导入时间
pub fn compensated_stats(
    prior: &ContainerStats,
    current: Option<&ContainerStats>,
    created: usize,
) -> ContainerStats {
    let Some(current) = current else {
        return prior.clone();
    };
    let later_imports = current.import_count > prior.import_count + 1;
    ContainerStats {
        container_id: prior.container_id.clone(),
        total_cases: (current.total_cases - created as i64).max(0),
        import_count: (current.import_count - 1).max(prior.import_count),
        last_import_at: if later_imports {
            current.last_import_at
        } else {
            prior.last_import_at
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::{ImportSession, RollbackSnapshot, SessionSummary};
    use crate::domain::test_case::{CandidateRecord, TestCase, TestCaseDraft};
    use crate::repository::error::RepositoryResult;
    use crate::repository::history_repo_impl::SqliteHistoryRepository;
    use crate::repository::test_case_repo_impl::SqliteTestCaseStore;
    use async_trait::async_trait;
    use tempfile::NamedTempFile;

    struct FailingStats;

    #[async_trait]
    impl StatsStore for FailingStats {
        async fn get_stats(&self, _container_id: &str) -> RepositoryResult<Option<ContainerStats>> {
            Ok(None)
        }

        async fn apply_import(&self, container_id: &str, _imported: usize) -> RepositoryResult<ContainerStats> {
            Ok(ContainerStats::empty(container_id))
        }

        async fn restore_stats(&self, _stats: &ContainerStats) -> RepositoryResult<()> {
            Err(RepositoryError::InternalError("stats offline".to_string()))
        }
    }

    struct FailingStore;

    #[async_trait]
    impl TestCaseStore for FailingStore {
        async fn create(&self, _draft: TestCaseDraft) -> RepositoryResult<TestCase> {
            Err(RepositoryError::LockError("busy".to_string()))
        }

        async fn delete_many(&self, _ids: &[String]) -> RepositoryResult<usize> {
            Err(RepositoryError::LockError("busy".to_string()))
        }

        async fn get_by_id(&self, _id: &str) -> RepositoryResult<Option<TestCase>> {
            Ok(None)
        }

        async fn count_by_project(&self, _project_id: &str) -> RepositoryResult<usize> {
            Ok(0)
        }
    }

    struct Fixture {
        _db: NamedTempFile,
        store: Arc<SqliteTestCaseStore>,
        history: Arc<HistoryStore>,
    }

    async fn fixture() -> Fixture {
        let db = NamedTempFile::new().unwrap();
        let path = db.path().to_str().unwrap().to_string();
        let store = Arc::new(SqliteTestCaseStore::new(&path).unwrap());
        let repo = Arc::new(SqliteHistoryRepository::new(&path).unwrap());
        let history = Arc::new(HistoryStore::load(repo, 10).await.unwrap());
        Fixture { _db: db, store, history }
    }

    async fn seed_session(fx: &Fixture, id: &str) -> ImportSession {
        let mut record = CandidateRecord::with_defaults(1);
        record.name = "Login".to_string();
        record.project_id = Some("p1".to_string());
        let draft = TestCaseDraft::from_candidate(&record).unwrap();
        let ids: Vec<String> = fx
            .store
            .create_many(vec![draft.clone(), draft])
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        fx.store.apply_import("p1", 2).await.unwrap();

        let session = ImportSession {
            session_id: id.to_string(),
            file_name: "cases.csv".to_string(),
            file_size: 10,
            file_type: None,
            project_id: Some("p1".to_string()),
            suite_id: None,
            created_at: Utc::now(),
            summary: SessionSummary::default(),
            errors: Vec::new(),
            warnings: Vec::new(),
            imported_test_case_ids: ids.clone(),
            snapshot: Some(RollbackSnapshot {
                created_ids: ids,
                prior_stats: Some(ContainerStats::empty("p1")),
                captured_at: Utc::now(),
            }),
            status: SessionStatus::Completed,
            rolled_back_at: None,
        };
        fx.history.record(session.clone()).await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_rollback_deletes_and_marks() {
        let fx = fixture().await;
        seed_session(&fx, "s1").await;
        let manager = RollbackManager::new(fx.store.clone(), Some(fx.store.clone()), fx.history.clone());

        assert!(manager.can_rollback("s1").await);
        let outcome = manager.rollback("s1").await.unwrap();
        assert_eq!(outcome.deleted, 2);
        assert!(outcome.stats_restored);
        assert_eq!(fx.store.count_by_project("p1").await.unwrap(), 0);
        assert_eq!(fx.store.get_stats("p1").await.unwrap().unwrap().total_cases, 0);

        let session = fx.history.get("s1").await.unwrap();
        assert_eq!(session.status, SessionStatus::RolledBack);
        assert!(session.rolled_back_at.is_some());

        assert!(matches!(
            manager.rollback("s1").await,
            Err(RollbackError::AlreadyRolledBack(_))
        ));
        assert!(!manager.can_rollback("s1").await);
    }

    #[tokio::test]
    async fn test_rollback_older_session_keeps_newer_counts() {
        let fx = fixture().await;
        seed_session(&fx, "older").await;

        // 之后的第二次导入（3 条）
        let mut record = CandidateRecord::with_defaults(1);
        record.name = "Search".to_string();
        record.project_id = Some("p1".to_string());
        let draft = TestCaseDraft::from_candidate(&record).unwrap();
        fx.store
            .create_many(vec![draft.clone(), draft.clone(), draft])
            .await
            .unwrap();
        let after_newer = fx.store.apply_import("p1", 3).await.unwrap();
        assert_eq!(after_newer.total_cases, 5);

        let manager = RollbackManager::new(fx.store.clone(), Some(fx.store.clone()), fx.history.clone());
        manager.rollback("older").await.unwrap();

        let stats = fx.store.get_stats("p1").await.unwrap().unwrap();
        assert_eq!(stats.total_cases, 3);
        assert_eq!(stats.import_count, 1);
        assert_eq!(stats.last_import_at, after_newer.last_import_at);
        assert_eq!(fx.store.count_by_project("p1").await.unwrap(), 3);
    }

    #[test]
    fn test_compensated_stats() {
        let prior = ContainerStats {
            container_id: "p1".to_string(),
            total_cases: 4,
            import_count: 2,
            last_import_at: None,
        };
        assert_eq!(compensated_stats(&prior, None, 3), prior);

        let current = ContainerStats {
            container_id: "p1".to_string(),
            total_cases: 7,
            import_count: 3,
            last_import_at: Some(Utc::now()),
        };
        assert_eq!(compensated_stats(&prior, Some(&current), 3), prior);
    }

    #[tokio::test]
    async fn test_stats_failure_keeps_status() {
        let fx = fixture().await;
        seed_session(&fx, "s1").await;
        let manager = RollbackManager::new(fx.store.clone(), Some(Arc::new(FailingStats)), fx.history.clone());

        let result = manager.rollback("s1").await;
        assert!(matches!(result, Err(RollbackError::StatsRestoreFailed(_))));
        assert_eq!(fx.history.get("s1").await.unwrap().status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn test_delete_failure_is_distinct() {
        let fx = fixture().await;
        seed_session(&fx, "s1").await;
        let manager = RollbackManager::new(Arc::new(FailingStore), None, fx.history.clone());

        let result = manager.rollback("s1").await;
        assert!(matches!(result, Err(RollbackError::DeleteFailed(_))));
        assert_eq!(fx.history.get("s1").await.unwrap().status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn test_not_found_and_not_reversible() {
        let fx = fixture().await;
        let manager = RollbackManager::new(fx.store.clone(), None, fx.history.clone());
        assert!(matches!(
            manager.rollback("nope").await,
            Err(RollbackError::SessionNotFound(_))
        ));

        let mut session = seed_session(&fx, "s2").await;
        session.session_id = "empty".to_string();
        session.imported_test_case_ids.clear();
        fx.history.record(session).await.unwrap();
        assert!(matches!(
            manager.rollback("empty").await,
            Err(RollbackError::NotReversible(_, _))
        ));
    }
}
