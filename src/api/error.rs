// ==========================================
// 测试用例导入 - API 层错误类型
// ==========================================
// 职责: 定义 API 层错误类型，将仓储/回滚错误转换为面向调用方的错误消息
// ==========================================

use crate::history::RollbackError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入与资源错误
    // ==========================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Database connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("Database transaction failed: {0}")]
    DatabaseTransactionError(String),

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    // ==========================================
    // 回滚错误（删除失败与统计恢复失败分开报告）
    // ==========================================
    #[error("Rollback failed, nothing was changed: {0}")]
    RollbackFailed(String),

    #[error("Rollback incomplete, test cases deleted but statistics not restored: {0}")]
    RollbackIncomplete(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} (id={})", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("failed to acquire lock: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg)
            | RepositoryError::ForeignKeyViolation(msg) => ApiError::ConstraintViolation(msg),
            RepositoryError::SerializationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
        }
    }
}

// ==========================================
// 从 RollbackError 转换
// ==========================================
impl From<RollbackError> for ApiError {
    fn from(err: RollbackError) -> Self {
        match err {
            RollbackError::SessionNotFound(id) => ApiError::NotFound(format!("import session {}", id)),
            RollbackError::AlreadyRolledBack(_) => ApiError::InvalidStateTransition {
                from: "rolled_back".to_string(),
                to: "rolled_back".to_string(),
            },
            RollbackError::NotReversible(id, reason) => {
                ApiError::InvalidInput(format!("session {} cannot be rolled back: {}", id, reason))
            }
            RollbackError::DeleteFailed(e) => ApiError::RollbackFailed(e.to_string()),
            RollbackError::StatsRestoreFailed(e) => ApiError::RollbackIncomplete(e.to_string()),
            RollbackError::History(e) => ApiError::from(e),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
