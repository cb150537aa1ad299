use axum::{http::StatusCode, response::IntoResponse, Json};
use bulkq_core::{JobStats, JobStatus, Record};
use serde::{Deserialize, Serialize};

/// 只带提示信息的响应，`/`、`/dpd_insert` 与 `/delete_all` 失败时使用
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// 提交任务后的响应，客户端凭 `task_id` 查询或撤销
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSubmittedResponse {
    pub success: bool,
    pub message: String,
    pub task_id: String,
}

impl TaskSubmittedResponse {
    pub fn new(message: impl Into<String>, task_id: String) -> Self {
        Self {
            success: true,
            message: message.into(),
            task_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    pub success: bool,
    pub task_id: String,
    pub status: JobStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAllResponse {
    pub success: bool,
    pub message: String,
    pub num_rows_deleted: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Record>,
}

impl DataResponse {
    pub fn new(data: Vec<Record>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    pub success: bool,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
    pub database: String,
    /// 尚未进入终态的任务数
    pub active_jobs: usize,
    pub jobs: JobStats,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.success
    }
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> axum::response::Response {
        let status = if self.is_healthy() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (status, Json(self)).into_response()
    }
}
