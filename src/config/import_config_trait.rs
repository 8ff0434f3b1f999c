// ==========================================
// 测试用例导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入管道所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ==========================================
// ImportConfig - 导入管道可调常量
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportConfig {
    pub max_file_size_bytes: u64,     // 超过即拒绝
    pub soft_size_warning_bytes: u64, // 超过即告警
    pub min_description_length: usize,
    pub empty_row_warn_ratio: f64,
    pub batch_size: usize,            // 落库分块大小
    pub history_capacity: usize,      // 历史会话保留上限
    pub similarity_threshold: f64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 10 * 1024 * 1024,
            soft_size_warning_bytes: 1024 * 1024,
            min_description_length: 10,
            empty_row_warn_ratio: 0.5,
            batch_size: 50,
            history_capacity: 50,
            similarity_threshold: 0.8,
        }
    }
}

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入管道所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 文件大小 =====

    /// 最大文件大小（字节）
    ///
    /// # 默认值
    /// - 10 MiB
    async fn get_max_file_size_bytes(&self) -> RepositoryResult<u64>;

    /// 软告警文件大小（字节）
    ///
    /// # 默认值
    /// - 1 MiB
    async fn get_soft_size_warning_bytes(&self) -> RepositoryResult<u64>;

    // ===== 数据质量阈值 =====

    /// 描述最短长度（低于则 info）
    ///
    /// # 默认值
    /// - 10
    async fn get_min_description_length(&self) -> RepositoryResult<usize>;

    /// 空白行告警占比
    ///
    /// # 默认值
    /// - 0.5
    async fn get_empty_row_warn_ratio(&self) -> RepositoryResult<f64>;

    /// 查重默认相似度阈值
    ///
    /// # 默认值
    /// - 0.8
    async fn get_similarity_threshold(&self) -> RepositoryResult<f64>;

    // ===== 持久化 =====

    /// 落库分块大小
    ///
    /// # 默认值
    /// - 50
    async fn get_batch_size(&self) -> RepositoryResult<usize>;

    /// 历史会话保留上限
    ///
    /// # 默认值
    /// - 50
    async fn get_history_capacity(&self) -> RepositoryResult<usize>;

    /// 一次性读取全部导入配置
    async fn load_import_config(&self) -> RepositoryResult<ImportConfig> {
        Ok(ImportConfig {
            max_file_size_bytes: self.get_max_file_size_bytes().await?,
            soft_size_warning_bytes: self.get_soft_size_warning_bytes().await?,
            min_description_length: self.get_min_description_length().await?,
            empty_row_warn_ratio: self.get_empty_row_warn_ratio().await?,
            batch_size: self.get_batch_size().await?,
            history_capacity: self.get_history_capacity().await?,
            similarity_threshold: self.get_similarity_threshold().await?,
        })
    }
}
