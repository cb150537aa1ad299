use axum::extract::State;
use tracing::warn;

use crate::{response::HealthResponse, routes::AppState};

/// 数据库连通性与任务跟踪器统计
pub async fn health_check(State(state): State<AppState>) -> HealthResponse {
    let jobs = state.queue.stats().await.unwrap_or_else(|e| {
        warn!("读取任务统计失败: {}", e);
        Default::default()
    });

    match state.store.ping().await {
        Ok(()) => HealthResponse {
            success: true,
            status: "healthy".to_string(),
            database: "ok".to_string(),
            active_jobs: jobs.active(),
            jobs,
        },
        Err(e) => {
            warn!("数据库健康检查失败: {}", e);
            HealthResponse {
                success: false,
                status: "unhealthy".to_string(),
                database: e.to_string(),
                active_jobs: jobs.active(),
                jobs,
            }
        }
    }
}
