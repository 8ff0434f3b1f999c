// ==========================================
// 测试用例导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::config::import_config_trait::{ImportConfig, ImportConfigReader};
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入配置值（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute(
            "INSERT INTO config_kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（key 有序）
    pub fn get_config_snapshot(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare("SELECT key, value FROM config_kv ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    /// 读取并解析配置值；缺失或格式错误时返回默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr + Copy,
    {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!(config_key = key, raw_value = %raw, "配置值格式错误，使用默认值");
                    Ok(default)
                }
            },
        }
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_max_file_size_bytes(&self) -> RepositoryResult<u64> {
        let defaults = ImportConfig::default();
        self.get_parsed_or_default(config_keys::MAX_FILE_SIZE_BYTES, defaults.max_file_size_bytes)
    }

    async fn get_soft_size_warning_bytes(&self) -> RepositoryResult<u64> {
        let defaults = ImportConfig::default();
        self.get_parsed_or_default(
            config_keys::SOFT_SIZE_WARNING_BYTES,
            defaults.soft_size_warning_bytes,
        )
    }

    async fn get_min_description_length(&self) -> RepositoryResult<usize> {
        let defaults = ImportConfig::default();
        self.get_parsed_or_default(
            config_keys::MIN_DESCRIPTION_LENGTH,
            defaults.min_description_length,
        )
    }

    async fn get_empty_row_warn_ratio(&self) -> RepositoryResult<f64> {
        let defaults = ImportConfig::default();
        let ratio =
            self.get_parsed_or_default(config_keys::EMPTY_ROW_WARN_RATIO, defaults.empty_row_warn_ratio)?;
        Ok(if (0.0..=1.0).contains(&ratio) {
            ratio
        } else {
            defaults.empty_row_warn_ratio
        })
    }

    async fn get_similarity_threshold(&self) -> RepositoryResult<f64> {
        let defaults = ImportConfig::default();
        let threshold =
            self.get_parsed_or_default(config_keys::SIMILARITY_THRESHOLD, defaults.similarity_threshold)?;
        Ok(if (0.0..=1.0).contains(&threshold) {
            threshold
        } else {
            defaults.similarity_threshold
        })
    }

    async fn get_batch_size(&self) -> RepositoryResult<usize> {
        let defaults = ImportConfig::default();
        let size = self.get_parsed_or_default(config_keys::BATCH_SIZE, defaults.batch_size)?;
        Ok(size.max(1))
    }

    async fn get_history_capacity(&self) -> RepositoryResult<usize> {
        let defaults = ImportConfig::default();
        let capacity =
            self.get_parsed_or_default(config_keys::HISTORY_CAPACITY, defaults.history_capacity)?;
        Ok(capacity.max(1))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 文件大小
    pub const MAX_FILE_SIZE_BYTES: &str = "import.max_file_size_bytes";
    pub const SOFT_SIZE_WARNING_BYTES: &str = "import.soft_size_warning_bytes";

    // 数据质量
    pub const MIN_DESCRIPTION_LENGTH: &str = "import.min_description_length";
    pub const EMPTY_ROW_WARN_RATIO: &str = "import.empty_row_warn_ratio";
    pub const SIMILARITY_THRESHOLD: &str = "import.similarity_threshold";

    // 持久化
    pub const BATCH_SIZE: &str = "import.batch_size";
    pub const HISTORY_CAPACITY: &str = "import.history_capacity";
}
