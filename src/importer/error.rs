// ==========================================
// 测试用例导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 字段级问题不走 Err，只作为 ValidationIssue 数据返回
// ==========================================

use thiserror::Error;

/// 导入模块错误类型（均为整体失败）
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("File read failed: {0}")]
    FileReadError(String),

    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    // ===== 解析错误（致命）=====
    #[error("Parse failed: {0}")]
    ParseError(String),

    // ===== 持久化错误 =====
    #[error("Failed to save test cases: {0}")]
    StoreError(String),

    #[error("Failed to record import session: {0}")]
    HistoryError(String),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ImportError::FileNotFound(err.to_string()),
            _ => ImportError::FileReadError(err.to_string()),
        }
    }
}

impl From<crate::repository::RepositoryError> for ImportError {
    fn from(err: crate::repository::RepositoryError) -> Self {
        ImportError::StoreError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::ParseError(format!("Invalid delimited text: {}", err))
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ParseError(format!("Unreadable spreadsheet: {}", err))
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::ParseError(format!("Invalid JSON: {}", err))
    }
}
