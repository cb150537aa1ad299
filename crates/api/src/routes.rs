use axum::{routing::get, Router};
use bulkq_core::{JobQueue, RecordStore};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use crate::handlers::{
    data::{delete_all, get_count, get_data},
    health::health_check,
    jobs::{dpd_insert, insert, insert_default, status, stop},
    metrics::get_metrics,
    root::root,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub queue: Arc<dyn JobQueue>,
    pub default_insert_count: u64,
    pub metrics: Option<PrometheusHandle>,
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/insert", get(insert_default))
        .route("/insert/{num}", get(insert))
        .route("/dpd_insert/{num}", get(dpd_insert))
        .route("/stop/{task_id}", get(stop))
        .route("/status/{task_id}", get(status))
        .route("/delete_all", get(delete_all).delete(delete_all))
        .route("/get_data", get(get_data))
        .route("/get_data/count", get(get_count))
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .with_state(state)
}
