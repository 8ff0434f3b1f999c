// ==========================================
// 测试用例导入 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表（幂等）
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开内存数据库（测试与一次性导入）
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// 建表（IF NOT EXISTS，可重复调用）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS test_case (
            id              TEXT PRIMARY KEY,
            project_id      TEXT,
            suite_id        TEXT,
            name            TEXT NOT NULL,
            description     TEXT NOT NULL DEFAULT '',
            preconditions   TEXT NOT NULL DEFAULT '',
            test_steps      TEXT NOT NULL DEFAULT '',
            expected_result TEXT NOT NULL DEFAULT '',
            actual_result   TEXT NOT NULL DEFAULT '',
            test_data       TEXT NOT NULL DEFAULT '',
            status          TEXT NOT NULL,
            priority        TEXT NOT NULL,
            category        TEXT NOT NULL,
            environment     TEXT NOT NULL,
            assigned_tester TEXT,
            tags_json       TEXT NOT NULL DEFAULT '[]',
            source_row      INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_test_case_project ON test_case(project_id);

        CREATE TABLE IF NOT EXISTS container_stats (
            container_id   TEXT PRIMARY KEY,
            total_cases    INTEGER NOT NULL DEFAULT 0,
            import_count   INTEGER NOT NULL DEFAULT 0,
            last_import_at TEXT
        );

        CREATE TABLE IF NOT EXISTS import_session (
            session_id   TEXT PRIMARY KEY,
            created_at   TEXT NOT NULL,
            status       TEXT NOT NULL,
            payload_json TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_import_session_created ON import_session(created_at);

        CREATE TABLE IF NOT EXISTS config_kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )
}
