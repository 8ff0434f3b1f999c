// ==========================================
// 测试用例导入 - 导入历史存储
// ==========================================
// 生命周期: 构造时从仓储加载，每次变更后立即持久化
// 顺序: 最近优先（按 created_at 倒序）
// 容量: 超出上限时静默淘汰最旧会话（非错误）
// 并发: 所有读写经同一把 tokio Mutex 串行化
// ==========================================

use crate::domain::import::ImportSession;
use crate::domain::types::SessionStatus;
use crate::repository::error::RepositoryResult;
use crate::repository::history_repo::ImportHistoryRepository;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct HistoryStore {
    repo: Arc<dyn ImportHistoryRepository>,
    capacity: usize,
    sessions: Mutex<VecDeque<ImportSession>>,
}

impl HistoryStore {
    /// 加载历史（超出容量的旧会话在加载时即被淘汰）
    ///
    /// # 参数
    /// - repo: 历史持久化仓储
    /// - capacity: 最大保留会话数（最小为 1）
    pub async fn load(repo: Arc<dyn ImportHistoryRepository>, capacity: usize) -> RepositoryResult<Self> {
        let mut loaded = repo.load_all().await?;
        sort_recent_first(&mut loaded);

        let store = Self {
            repo,
            capacity: capacity.max(1),
            sessions: Mutex::new(loaded.into_iter().collect()),
        };

        {
            let mut sessions = store.sessions.lock().await;
            store.evict_overflow(&mut sessions).await?;
            info!(sessions = sessions.len(), capacity = store.capacity, "导入历史已加载");
        }

        Ok(store)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 记录一次导入会话
    pub async fn record(&self, session: ImportSession) -> RepositoryResult<()> {
        let mut sessions = self.sessions.lock().await;

        self.repo.upsert(&session).await?;
        debug!(session_id = %session.session_id, status = %session.status, "记录导入会话");

        sessions.retain(|s| s.session_id != session.session_id);
        sessions.push_front(session);
        sessions.make_contiguous().sort_by(|a, b| b.created_at.cmp(&a.created_at));

        self.evict_overflow(&mut sessions).await
    }

    /// 全部会话（最近优先）
    pub async fn list(&self) -> Vec<ImportSession> {
        self.sessions.lock().await.iter().cloned().collect()
    }

    pub async fn get(&self, session_id: &str) -> Option<ImportSession> {
        self.sessions
            .lock()
            .await
            .iter()
            .find(|s| s.session_id == session_id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// 更新会话状态
    ///
    /// # 返回
    /// - Ok(Some(session)): 更新后的会话
    /// - Ok(None): 会话不存在
    pub async fn update_status(
        &self,
        session_id: &str,
        status: SessionStatus,
        rolled_back_at: Option<DateTime<Utc>>,
    ) -> RepositoryResult<Option<ImportSession>> {
        let mut sessions = self.sessions.lock().await;

        let Some(session) = sessions.iter_mut().find(|s| s.session_id == session_id) else {
            return Ok(None);
        };

        let mut updated = session.clone();
        updated.status = status;
        updated.rolled_back_at = rolled_back_at;

        // 先落盘再改内存，失败时内存保持原状
        self.repo.upsert(&updated).await?;
        *session = updated.clone();

        Ok(Some(updated))
    }

    /// 删除单个会话
    pub async fn delete(&self, session_id: &str) -> RepositoryResult<bool> {
        let mut sessions = self.sessions.lock().await;

        let existed = sessions.iter().any(|s| s.session_id == session_id);
        if existed {
            self.repo.delete(session_id).await?;
            sessions.retain(|s| s.session_id != session_id);
        }
        Ok(existed)
    }

    /// 清空历史（不影响已导入的记录）
    pub async fn clear(&self) -> RepositoryResult<usize> {
        let mut sessions = self.sessions.lock().await;
        self.repo.clear().await?;
        let removed = sessions.len();
        sessions.clear();
        info!(removed = removed, "导入历史已清空");
        Ok(removed)
    }

    /// 导出历史为 JSON 列表（仅会话元数据）
    pub async fn export_json(&self) -> RepositoryResult<String> {
        let sessions = self.sessions.lock().await;
        let list: Vec<&ImportSession> = sessions.iter().collect();
        Ok(serde_json::to_string_pretty(&list)?)
    }

    /// 导入 JSON 列表: 按 session_id 合并（导入值覆盖已有值），重新排序并应用容量
    ///
    /// # 返回
    /// - Ok(usize): 合并的会话条数
    pub async fn import_json(&self, json: &str) -> RepositoryResult<usize> {
        let incoming: Vec<ImportSession> = serde_json::from_str(json)?;
        let mut sessions = self.sessions.lock().await;

        for session in &incoming {
            self.repo.upsert(session).await?;
            sessions.retain(|s| s.session_id != session.session_id);
            sessions.push_back(session.clone());
        }
        sessions.make_contiguous().sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.evict_overflow(&mut sessions).await?;

        info!(merged = incoming.len(), total = sessions.len(), "导入历史已合并");
        Ok(incoming.len())
    }

    /// 淘汰超出容量的最旧会话
    async fn evict_overflow(&self, sessions: &mut VecDeque<ImportSession>) -> RepositoryResult<()> {
        while sessions.len() > self.capacity {
            if let Some(oldest) = sessions.pop_back() {
                self.repo.delete(&oldest.session_id).await?;
                debug!(session_id = %oldest.session_id, "淘汰最旧导入会话");
            }
        }
        Ok(())
    }
}

fn sort_recent_first(sessions: &mut [ImportSession]) {
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
