//! # Bulkq API
//!
//! 批量写入任务队列的 HTTP 接口，基于 Axum 构建。
//!
//! ## API 端点
//!
//! - `GET /` - 服务信息
//! - `GET /insert[/{num}]` - 异步提交批量写入任务，返回 `task_id`
//! - `GET /dpd_insert/{num}` - 同步写入（已弃用，阻塞请求）
//! - `GET /stop/{task_id}` - 撤销任务并回滚未提交的写入
//! - `GET /status/{task_id}` - 查询任务状态
//! - `GET|DELETE /delete_all` - 清空数据表
//! - `GET /get_data` - 列出全部记录
//! - `GET /get_data/count` - 记录数
//! - `GET /health` - 数据库健康检查与任务统计
//! - `GET /metrics` - Prometheus 指标
//!
//! 所有错误以统一的 JSON 结构返回，见 [`error::ApiError`]。

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use axum::Router;
use bulkq_core::config::ApiConfig;
use tower::ServiceBuilder;

use middleware::{cors_layer, request_logging, trace_layer};
pub use routes::{create_routes, AppState};

/// 创建完整的API应用
pub fn create_app(state: AppState, api_config: &ApiConfig) -> Router {
    create_routes(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(cors_layer(api_config.cors_enabled))
            .layer(axum::middleware::from_fn(request_logging)),
    )
}
