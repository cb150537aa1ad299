use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use bulkq_core::{
    config::WorkerConfig, traits::JobBroker, BulkqResult, JobControlMessage, JobKind, JobStatus,
};
use futures::{future::join_all, FutureExt};
use tokio::sync::{broadcast, Notify, RwLock, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::executors::JobExecutor;
use crate::metrics;

#[derive(Debug, Clone)]
pub struct WorkerServiceConfig {
    pub concurrency: usize,
    pub shutdown_grace: Duration,
}

impl Default for WorkerServiceConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            shutdown_grace: Duration::from_secs(30),
        }
    }
}

impl From<&WorkerConfig> for WorkerServiceConfig {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            shutdown_grace: Duration::from_secs(config.shutdown_grace_seconds),
        }
    }
}

/// 已派发任务的句柄
struct RunningJob {
    handle: JoinHandle<()>,
    terminate: Arc<Notify>,
}

/// 任务执行服务
///
/// 从队列中取出任务，写入任务按 `concurrency` 限制并发执行，撤销任务不占用许可。
/// 收到带 `terminate` 的撤销消息时丢弃对应任务的执行过程，未提交的事务随之回滚，
/// 之后任务记为 REVOKED；已经执行完成的任务保留原结果。
pub struct WorkerService {
    broker: Arc<dyn JobBroker>,
    executor: JobExecutor,
    config: WorkerServiceConfig,
    semaphore: Arc<Semaphore>,
    running: Arc<RwLock<HashMap<String, RunningJob>>>,
}

impl WorkerService {
    pub fn new(
        broker: Arc<dyn JobBroker>,
        executor: JobExecutor,
        config: WorkerServiceConfig,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
        Self {
            broker,
            executor,
            config,
            semaphore,
            running: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 运行主循环，直到收到关闭信号或队列关闭
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> BulkqResult<()> {
        let mut control_rx = self.broker.subscribe_control();
        info!("Worker服务启动，并发数: {}", self.config.concurrency);

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    info!("Worker收到关闭信号");
                    break;
                }
                control = control_rx.recv() => match control {
                    Ok(message) => self.handle_control(message).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("控制消息积压，丢弃了 {} 条", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        warn!("控制消息通道已关闭");
                        break;
                    }
                },
                job = self.broker.receive() => match job {
                    Some((job_id, kind)) => self.dispatch(job_id, kind).await,
                    None => {
                        info!("任务队列已关闭，Worker停止接收任务");
                        break;
                    }
                },
            }
        }

        self.shutdown().await;
        info!("Worker服务已停止");
        Ok(())
    }

    /// 当前正在跟踪的任务 id
    pub async fn running_jobs(&self) -> Vec<String> {
        self.running.read().await.keys().cloned().collect()
    }

    async fn dispatch(&self, job_id: String, kind: JobKind) {
        match self.broker.status(&job_id).await {
            Ok(JobStatus::Revoked) => {
                info!("任务 {} 已被撤销，跳过执行", job_id);
                return;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("查询任务 {} 状态失败: {}", job_id, e);
            }
        }

        let broker = Arc::clone(&self.broker);
        let executor = self.executor.clone();
        let semaphore = Arc::clone(&self.semaphore);
        let running = Arc::clone(&self.running);
        let terminate = Arc::new(Notify::new());
        let job_terminate = Arc::clone(&terminate);
        let id = job_id.clone();

        // 持有写锁直到句柄登记完成，任务结束时的移除一定发生在登记之后
        let mut guard = self.running.write().await;
        let handle = tokio::spawn(async move {
            let permit = match &kind {
                JobKind::Cancel { .. } => Ok(None),
                JobKind::Insert { .. } => semaphore.acquire_owned().await.map(Some),
            };
            if let Ok(_permit) = permit {
                Self::execute_job(broker.as_ref(), &executor, &id, &kind, &job_terminate).await;
            }
            let mut running = running.write().await;
            running.remove(&id);
            metrics::set_running_jobs(running.len());
        });
        guard.insert(job_id, RunningJob { handle, terminate });
        metrics::set_running_jobs(guard.len());
    }

    async fn execute_job(
        broker: &dyn JobBroker,
        executor: &JobExecutor,
        job_id: &str,
        kind: &JobKind,
        terminate: &Notify,
    ) {
        match broker.mark_started(job_id).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("任务 {} 不再处于等待状态，跳过执行", job_id);
                return;
            }
            Err(e) => {
                warn!("标记任务 {} 开始失败: {}", job_id, e);
                return;
            }
        }
        metrics::record_job_started(kind);

        let execution = AssertUnwindSafe(executor.execute(job_id, kind)).catch_unwind();
        let (status, error) = tokio::select! {
            biased;

            _ = terminate.notified() => {
                metrics::record_job_revoked();
                warn!("强制终止任务: {}", job_id);
                (JobStatus::Revoked, None)
            }
            outcome = execution => match outcome {
                Ok(Ok(())) => (JobStatus::Success, None),
                Ok(Err(e)) => {
                    error!("任务 {} 执行失败: {}", job_id, e);
                    (JobStatus::Failure, Some(e.to_string()))
                }
                Err(panic) => {
                    let reason = panic_reason(panic.as_ref());
                    error!("任务 {} 执行时发生panic: {}", job_id, reason);
                    (JobStatus::Failure, Some(format!("任务执行异常: {reason}")))
                }
            },
        };

        match broker.mark_finished(job_id, status, error).await {
            Ok(true) => {
                metrics::record_job_finished(kind, status);
                info!("任务 {} 完成，状态: {}", job_id, status);
            }
            Ok(false) => {
                info!("任务 {} 已处于终态，忽略执行结果 {}", job_id, status);
            }
            Err(e) => {
                warn!("更新任务 {} 状态失败: {}", job_id, e);
            }
        }
    }

    async fn handle_control(&self, message: JobControlMessage) {
        if !message.terminate {
            return;
        }

        match self.running.read().await.get(&message.job_id) {
            // 通知会保留到任务开始等待，不会因先后顺序丢失
            Some(job) => job.terminate.notify_one(),
            None => {
                debug!("任务 {} 未在本Worker运行，无需终止", message.job_id);
            }
        }
    }

    async fn shutdown(&self) {
        // 尚未拿到许可的任务不再开始
        self.semaphore.close();

        let handles: Vec<JoinHandle<()>> = {
            let mut running = self.running.write().await;
            running.drain().map(|(_, job)| job.handle).collect()
        };
        metrics::set_running_jobs(0);

        if handles.is_empty() {
            return;
        }

        info!(
            "等待 {} 个任务结束（超时: {:?}）",
            handles.len(),
            self.config.shutdown_grace
        );
        let abort_handles: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();

        if tokio::time::timeout(self.config.shutdown_grace, join_all(handles))
            .await
            .is_err()
        {
            warn!("等待任务结束超时，强制中止剩余任务");
            for handle in abort_handles {
                handle.abort();
            }
        }
    }
}

fn panic_reason(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
