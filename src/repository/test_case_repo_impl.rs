// ==========================================
// 测试用例导入 - 测试用例存储 SQLite 实现
// ==========================================
// 职责: test_case / container_stats 表的数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::test_case::{ContainerStats, TestCase, TestCaseDraft};
use crate::domain::types::{Category, Environment, Priority, TestStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::test_case_repo::{StatsStore, TestCaseStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

// ==========================================
// SqliteTestCaseStore
// ==========================================
pub struct SqliteTestCaseStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTestCaseStore {
    /// 创建新的 Store 实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与其他仓储共享连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在事务中插入一条记录
    fn insert_tx(
        tx: &Transaction,
        draft: TestCaseDraft,
        created_at: DateTime<Utc>,
    ) -> RepositoryResult<TestCase> {
        let id = Uuid::new_v4().to_string();
        let tags_json = serde_json::to_string(&draft.tags)?;

        tx.execute(
            r#"
            INSERT INTO test_case (
                id, project_id, suite_id, name, description, preconditions,
                test_steps, expected_result, actual_result, test_data,
                status, priority, category, environment, assigned_tester,
                tags_json, source_row, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18
            )
            "#,
            params![
                id,
                draft.project_id,
                draft.suite_id,
                draft.name,
                draft.description,
                draft.preconditions,
                draft.test_steps,
                draft.expected_result,
                draft.actual_result,
                draft.test_data,
                draft.status.as_str(),
                draft.priority.as_str(),
                draft.category.as_str(),
                draft.environment.as_str(),
                draft.assigned_tester,
                tags_json,
                draft.source_row as i64,
                created_at,
            ],
        )?;

        Ok(TestCase {
            id,
            draft,
            created_at,
        })
    }
}

/// test_case 行的原始列值
struct TestCaseRow {
    id: String,
    project_id: Option<String>,
    suite_id: Option<String>,
    name: String,
    description: String,
    preconditions: String,
    test_steps: String,
    expected_result: String,
    actual_result: String,
    test_data: String,
    status: String,
    priority: String,
    category: String,
    environment: String,
    assigned_tester: Option<String>,
    tags_json: String,
    source_row: i64,
    created_at: DateTime<Utc>,
}

impl TestCaseRow {
    fn into_test_case(self) -> RepositoryResult<TestCase> {
        let invalid = |field: &str, value: &str| {
            RepositoryError::InternalError(format!("invalid {} '{}' in test_case {}", field, value, self.id))
        };

        let status = TestStatus::parse(&self.status).ok_or_else(|| invalid("status", &self.status))?;
        let priority =
            Priority::parse(&self.priority).ok_or_else(|| invalid("priority", &self.priority))?;
        let category =
            Category::parse(&self.category).ok_or_else(|| invalid("category", &self.category))?;
        let environment = Environment::parse(&self.environment)
            .ok_or_else(|| invalid("environment", &self.environment))?;
        let tags: Vec<String> = serde_json::from_str(&self.tags_json)?;

        Ok(TestCase {
            id: self.id,
            draft: TestCaseDraft {
                project_id: self.project_id,
                suite_id: self.suite_id,
                name: self.name,
                description: self.description,
                preconditions: self.preconditions,
                test_steps: self.test_steps,
                expected_result: self.expected_result,
                actual_result: self.actual_result,
                test_data: self.test_data,
                status,
                priority,
                category,
                environment,
                assigned_tester: self.assigned_tester,
                tags,
                source_row: self.source_row.max(0) as usize,
            },
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl TestCaseStore for SqliteTestCaseStore {
    async fn create(&self, draft: TestCaseDraft) -> RepositoryResult<TestCase> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let created = Self::insert_tx(&tx, draft, Utc::now())?;
        tx.commit()?;
        Ok(created)
    }

    /// 单事务批量创建：任一失败则整体回滚；同批记录共用一个创建时间
    async fn create_many(&self, drafts: Vec<TestCaseDraft>) -> RepositoryResult<Vec<TestCase>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let created_at = Utc::now();

        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            created.push(Self::insert_tx(&tx, draft, created_at)?);
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(created)
    }

    async fn delete_many(&self, ids: &[String]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut deleted = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM test_case WHERE id = ?1")?;
            for id in ids {
                deleted += stmt.execute(params![id])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(deleted)
    }

    async fn get_by_id(&self, id: &str) -> RepositoryResult<Option<TestCase>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                r#"
                SELECT id, project_id, suite_id, name, description, preconditions,
                       test_steps, expected_result, actual_result, test_data,
                       status, priority, category, environment, assigned_tester,
                       tags_json, source_row, created_at
                FROM test_case WHERE id = ?1
                "#,
                params![id],
                |row| {
                    Ok(TestCaseRow {
                        id: row.get(0)?,
                        project_id: row.get(1)?,
                        suite_id: row.get(2)?,
                        name: row.get(3)?,
                        description: row.get(4)?,
                        preconditions: row.get(5)?,
                        test_steps: row.get(6)?,
                        expected_result: row.get(7)?,
                        actual_result: row.get(8)?,
                        test_data: row.get(9)?,
                        status: row.get(10)?,
                        priority: row.get(11)?,
                        category: row.get(12)?,
                        environment: row.get(13)?,
                        assigned_tester: row.get(14)?,
                        tags_json: row.get(15)?,
                        source_row: row.get(16)?,
                        created_at: row.get(17)?,
                    })
                },
            )
            .optional()?;

        row.map(TestCaseRow::into_test_case).transpose()
    }

    async fn count_by_project(&self, project_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM test_case WHERE project_id = ?1",
            params![project_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }
}

#[async_trait]
impl StatsStore for SqliteTestCaseStore {
    async fn get_stats(&self, container_id: &str) -> RepositoryResult<Option<ContainerStats>> {
        let conn = self.get_conn()?;
        let stats = conn
            .query_row(
                "SELECT container_id, total_cases, import_count, last_import_at
                 FROM container_stats WHERE container_id = ?1",
                params![container_id],
                |row| {
                    Ok(ContainerStats {
                        container_id: row.get(0)?,
                        total_cases: row.get(1)?,
                        import_count: row.get(2)?,
                        last_import_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(stats)
    }

    async fn apply_import(&self, container_id: &str, imported: usize) -> RepositoryResult<ContainerStats> {
        let now = Utc::now();
        {
            let conn = self.get_conn()?;
            conn.execute(
                r#"
                INSERT INTO container_stats (container_id, total_cases, import_count, last_import_at)
                VALUES (?1, ?2, 1, ?3)
                ON CONFLICT(container_id) DO UPDATE SET
                    total_cases = total_cases + ?2,
                    import_count = import_count + 1,
                    last_import_at = ?3
                "#,
                params![container_id, imported as i64, now],
            )?;
        }

        self.get_stats(container_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "ContainerStats".to_string(),
                id: container_id.to_string(),
            })
    }

    async fn restore_stats(&self, stats: &ContainerStats) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO container_stats (container_id, total_cases, import_count, last_import_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(container_id) DO UPDATE SET
                total_cases = ?2,
                import_count = ?3,
                last_import_at = ?4
            "#,
            params![
                stats.container_id,
                stats.total_cases,
                stats.import_count,
                stats.last_import_at
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_case::CandidateRecord;
    use tempfile::NamedTempFile;

    fn create_store() -> (NamedTempFile, SqliteTestCaseStore) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = SqliteTestCaseStore::new(temp_file.path().to_str().unwrap()).unwrap();
        (temp_file, store)
    }

    fn draft(name: &str) -> TestCaseDraft {
        let mut record = CandidateRecord::with_defaults(1);
        record.name = name.to_string();
        record.project_id = Some("proj-1".to_string());
        record.tags = "a, b".to_string();
        TestCaseDraft::from_candidate(&record).unwrap()
    }

    #[tokio::test]
    async fn test_create_get_delete() {
        let (_tmp, store) = create_store();
        let created = store.create_many(vec![draft("A"), draft("B")]).await.unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(store.count_by_project("proj-1").await.unwrap(), 2);
        let ids: Vec<String> = created.iter().map(|c| c.id.clone()).collect();

        let fetched = store.get_by_id(&ids[0]).await.unwrap().unwrap();
        assert_eq!(fetched, created[0]);
        assert_eq!(fetched.draft.name, "A");
        assert_eq!(fetched.draft.tags, vec!["a", "b"]);

        let deleted = store.delete_many(&ids).await.unwrap();
        assert_eq!(deleted, 2);
        assert!(store.get_by_id(&ids[0]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stats_apply_and_restore() {
        let (_tmp, store) = create_store();
        assert!(store.get_stats("proj-1").await.unwrap().is_none());

        let after = store.apply_import("proj-1", 3).await.unwrap();
        assert_eq!(after.total_cases, 3);
        assert_eq!(after.import_count, 1);

        store.restore_stats(&ContainerStats::empty("proj-1")).await.unwrap();
        let restored = store.get_stats("proj-1").await.unwrap().unwrap();
        assert_eq!(restored.total_cases, 0);
        assert_eq!(restored.import_count, 0);
        assert!(restored.last_import_at.is_none());
    }
}
