use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use bulkq_core::JobKind;
use bulkq_worker::run_bulk_insert;
use tracing::{info, warn};

use crate::{
    error::ApiResult,
    response::{MessageResponse, TaskStatusResponse, TaskSubmittedResponse},
    routes::AppState,
};

pub const INSERT_STARTED_MESSAGE: &str = "Insertion into database started asynchronously. Use task_id to get task status and/or stop ongoing task";
pub const DPD_INSERT_MESSAGE: &str =
    "Insertion into database completed synchronously while blocking the database server.";
pub const STOP_MESSAGE: &str =
    "Initiated request to revoke task and rollback database. Use task_id to get task status.";

/// `GET /insert`，使用配置的默认条数
pub async fn insert_default(
    State(state): State<AppState>,
) -> ApiResult<Json<TaskSubmittedResponse>> {
    let count = state.default_insert_count;
    submit_insert(&state, count).await
}

/// `GET /insert/{num}`
pub async fn insert(
    State(state): State<AppState>,
    num: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<TaskSubmittedResponse>> {
    let Path(count) = num?;
    submit_insert(&state, count).await
}

async fn submit_insert(state: &AppState, count: u64) -> ApiResult<Json<TaskSubmittedResponse>> {
    let task_id = state.queue.submit(JobKind::Insert { count }).await?;
    info!(task_id = %task_id, count, "批量写入任务已提交");
    Ok(Json(TaskSubmittedResponse::new(
        INSERT_STARTED_MESSAGE,
        task_id,
    )))
}

/// `GET /dpd_insert/{num}`：在请求内同步完成写入
///
/// 已弃用，写入期间请求一直阻塞。
pub async fn dpd_insert(
    State(state): State<AppState>,
    num: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(count) = num?;
    warn!(count, "同步写入接口已弃用，请使用 /insert");
    run_bulk_insert(state.store.as_ref(), count).await?;
    Ok(Json(MessageResponse::ok(DPD_INSERT_MESSAGE)))
}

/// `GET /stop/{task_id}`：提交撤销任务
///
/// 返回的 `task_id` 是被撤销的目标任务，而不是撤销任务本身。
pub async fn stop(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<TaskSubmittedResponse>> {
    let cancel_id = state
        .queue
        .submit(JobKind::Cancel {
            target_job_id: task_id.clone(),
        })
        .await?;
    info!(target_job_id = %task_id, cancel_job_id = %cancel_id, "撤销任务已提交");
    Ok(Json(TaskSubmittedResponse::new(STOP_MESSAGE, task_id)))
}

/// `GET /status/{task_id}`，未知 id 返回 UNKNOWN
pub async fn status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<TaskStatusResponse>> {
    let status = state.queue.status(&task_id).await?;
    Ok(Json(TaskStatusResponse {
        success: true,
        task_id,
        status,
    }))
}
