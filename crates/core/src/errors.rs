use thiserror::Error;

/// 批量写入服务错误类型定义
///
/// 存储层的所有失败（连接、约束、提交）统一归入 [`BulkqError::Storage`]，
/// 任务边界只区分成功与失败。
#[derive(Debug, Error)]
pub enum BulkqError {
    #[error("存储错误: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("任务未找到: {id}")]
    JobNotFound { id: String },

    #[error("消息队列错误: {0}")]
    MessageQueue(String),

    #[error("无效的任务参数: {0}")]
    InvalidJobParams(String),
}

impl BulkqError {
    /// 是否为存储层错误
    pub fn is_storage(&self) -> bool {
        matches!(self, BulkqError::Storage(_))
    }
}

/// 统一的Result类型
pub type Result<T> = std::result::Result<T, BulkqError>;
