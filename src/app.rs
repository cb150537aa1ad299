use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use bulkq_api::{create_app, AppState};
use bulkq_core::{config::AppConfig, JobBroker};
use bulkq_infrastructure::{DatabaseManager, InMemoryJobQueue, InMemoryQueueConfig};
use bulkq_worker::{JobExecutor, WorkerService, WorkerServiceConfig};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{error, info, warn};

/// 进程内的完整服务：数据库、任务队列、Worker 与 HTTP API
pub struct Application {
    config: AppConfig,
    database: DatabaseManager,
    queue: Arc<InMemoryJobQueue>,
    metrics: Option<PrometheusHandle>,
}

impl Application {
    pub async fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "初始化应用程序，数据库: {:?}",
            bulkq_infrastructure::DatabaseType::from_url(&config.database.url)
        );

        let database = DatabaseManager::new(&config.database)
            .await
            .context("连接数据库失败")?;
        database.migrate().await.context("初始化数据表失败")?;

        let queue = Arc::new(InMemoryJobQueue::with_config(InMemoryQueueConfig::from(
            &config.worker,
        )));

        let metrics = if config.observability.metrics_enabled {
            Some(install_metrics_recorder()?)
        } else {
            None
        };

        Ok(Self {
            config,
            database,
            queue,
            metrics,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 构建带中间件的路由
    pub fn router(&self) -> Router {
        let state = AppState {
            store: self.database.record_store(),
            queue: self.queue.clone(),
            default_insert_count: self.config.api.default_insert_count,
            metrics: self.metrics.clone(),
        };
        create_app(state, &self.config.api)
    }

    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let listener = TcpListener::bind(&self.config.api.bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", self.config.api.bind_address))?;
        self.serve(listener, shutdown_rx).await
    }

    /// 在给定的监听器上运行，直到收到关闭信号
    pub async fn serve(
        &self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        self.queue.start_cleanup_task();

        let executor = JobExecutor::new(self.database.record_store(), self.queue.clone());
        let worker = Arc::new(WorkerService::new(
            self.queue.clone(),
            executor,
            WorkerServiceConfig::from(&self.config.worker),
        ));
        let worker_handle = {
            let worker = Arc::clone(&worker);
            let shutdown_rx = shutdown_rx.resubscribe();
            tokio::spawn(async move { worker.run(shutdown_rx).await })
        };

        let local_addr = listener.local_addr().context("读取监听地址失败")?;
        info!("API服务器启动在 http://{}", local_addr);

        let server = axum::serve(listener, self.router()).with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("API服务器收到关闭信号");
        });
        if let Err(e) = server.await {
            error!("API服务器运行失败: {}", e);
        }

        // 不再接受新任务
        self.queue.close().await;

        match worker_handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Worker停止时出错: {}", e),
            Err(e) => warn!("Worker任务异常退出: {}", e),
        }

        self.database.close().await;
        info!("应用程序已停止");
        Ok(())
    }
}

fn install_metrics_recorder() -> Result<PrometheusHandle> {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|e| anyhow::anyhow!("安装Prometheus指标记录器失败: {}", e))?;
    bulkq_worker::metrics::describe_metrics();
    Ok(handle)
}
