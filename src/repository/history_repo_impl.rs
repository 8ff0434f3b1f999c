// ==========================================
// 测试用例导入 - 导入历史仓储 SQLite 实现
// ==========================================
// 存储: import_session 表，会话整体序列化为 payload_json
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::import::ImportSession;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::history_repo::ImportHistoryRepository;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

pub struct SqliteHistoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteHistoryRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

#[async_trait]
impl ImportHistoryRepository for SqliteHistoryRepository {
    async fn load_all(&self) -> RepositoryResult<Vec<ImportSession>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT session_id, payload_json FROM import_session ORDER BY created_at DESC",
        )?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut sessions = Vec::with_capacity(rows.len());
        for (session_id, payload) in rows {
            // 单条损坏不影响其余历史
            match serde_json::from_str::<ImportSession>(&payload) {
                Ok(session) => sessions.push(session),
                Err(e) => warn!(session_id = %session_id, error = %e, "跳过无法解析的导入会话"),
            }
        }
        Ok(sessions)
    }

    async fn upsert(&self, session: &ImportSession) -> RepositoryResult<()> {
        let payload = serde_json::to_string(session)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO import_session (session_id, created_at, status, payload_json)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(session_id) DO UPDATE SET
                created_at = excluded.created_at,
                status = excluded.status,
                payload_json = excluded.payload_json
            "#,
            params![
                session.session_id,
                session.created_at,
                session.status.to_string(),
                payload
            ],
        )?;
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM import_session WHERE session_id = ?1",
            params![session_id],
        )?;
        Ok(affected > 0)
    }

    async fn clear(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM import_session", [])?;
        Ok(affected)
    }
}
