use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info};

use crate::{
    error::ApiResult,
    response::{CountResponse, DataResponse, DeleteAllResponse, MessageResponse},
    routes::AppState,
};

pub const DELETE_ALL_MESSAGE: &str = "Data table cleared";
pub const DELETE_ALL_FAILED_MESSAGE: &str = "Error clearing data table";

/// `GET|DELETE /delete_all`
///
/// 存储失败不向上传播，返回 `success: false`。
pub async fn delete_all(State(state): State<AppState>) -> Response {
    match state.store.delete_all().await {
        Ok(deleted) => {
            info!(num_rows_deleted = deleted, "数据表已清空");
            Json(DeleteAllResponse {
                success: true,
                message: DELETE_ALL_MESSAGE.to_string(),
                num_rows_deleted: deleted,
            })
            .into_response()
        }
        Err(e) => {
            error!(error = %e, "清空数据表失败");
            Json(MessageResponse::failed(DELETE_ALL_FAILED_MESSAGE)).into_response()
        }
    }
}

pub async fn get_data(State(state): State<AppState>) -> ApiResult<Json<DataResponse>> {
    let records = state.store.list_all().await?;
    Ok(Json(DataResponse::new(records)))
}

pub async fn get_count(State(state): State<AppState>) -> ApiResult<Json<CountResponse>> {
    let count = state.store.count().await?;
    Ok(Json(CountResponse {
        success: true,
        count,
    }))
}
