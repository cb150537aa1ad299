use axum::{
    extract::rejection::PathRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bulkq_core::BulkqError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("任务队列错误: {0}")]
    Core(#[from] BulkqError),

    #[error("未找到资源")]
    NotFound,

    #[error("请求参数错误: {0}")]
    BadRequest(String),
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_type, suggestions) = match &self {
            ApiError::Core(BulkqError::JobNotFound { id }) => (
                StatusCode::NOT_FOUND,
                format!("任务 {} 不存在", id),
                "JOB_NOT_FOUND",
                vec!["请检查task_id是否正确".to_string()],
            ),
            ApiError::Core(BulkqError::InvalidJobParams(msg)) => (
                StatusCode::BAD_REQUEST,
                format!("任务参数无效: {}", msg),
                "INVALID_JOB_PARAMS",
                vec!["num 必须是非负整数".to_string()],
            ),
            ApiError::Core(BulkqError::MessageQueue(msg)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("任务提交失败: {}", msg),
                "QUEUE_UNAVAILABLE",
                vec![
                    "队列已满或正在关闭，请稍后重试".to_string(),
                    "使用 GET /status/{task_id} 查看已提交任务的进度".to_string(),
                ],
            ),
            ApiError::Core(BulkqError::Storage(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "数据库操作失败，事务已回滚".to_string(),
                "STORAGE_ERROR",
                vec![
                    "查看 GET /health 检查数据库连接".to_string(),
                    format!("错误详情: {}", self),
                ],
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                format!("请求参数错误: {}", msg),
                "BAD_REQUEST",
                vec!["num 必须是非负整数".to_string()],
            ),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "请求的资源不存在".to_string(),
                "NOT_FOUND",
                vec!["访问 GET / 确认服务可用".to_string()],
            ),
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": error_type,
                "code": status.as_u16(),
                "suggestions": suggestions,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
