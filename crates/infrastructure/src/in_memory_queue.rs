use async_trait::async_trait;
use bulkq_core::{
    config::WorkerConfig,
    models::{JobControlMessage, JobExecutionMessage, JobInfo, JobKind, JobStats, JobStatus},
    traits::{JobBroker, JobQueue},
    BulkqError, BulkqResult,
};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 内存任务队列与状态跟踪器
///
/// 任务通过 Tokio channel 投递给 worker，状态保存在进程内的哈希表中；
/// 撤销请求通过 broadcast channel 通知所有 worker。
/// 进入终态的结果在保留期后被清理，之后查询返回 UNKNOWN。
pub struct InMemoryJobQueue {
    /// 任务 id -> 状态
    jobs: Arc<RwLock<HashMap<String, JobInfo>>>,
    /// 关闭时置为 None，之后 receive 在取完缓冲后返回 None
    sender: RwLock<Option<mpsc::UnboundedSender<JobExecutionMessage>>>,
    receiver: Mutex<mpsc::UnboundedReceiver<JobExecutionMessage>>,
    control_tx: broadcast::Sender<JobControlMessage>,
    closed: AtomicBool,
    config: InMemoryQueueConfig,
    /// 清理任务句柄
    cleanup_handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

#[derive(Debug, Clone)]
pub struct InMemoryQueueConfig {
    /// 未进入终态的任务上限
    pub max_queue_size: usize,
    /// 终态结果保留时间（秒）
    pub result_expires_seconds: u64,
    /// 自动清理间隔（秒），0 表示不清理
    pub cleanup_interval_seconds: u64,
    /// 控制消息广播缓冲
    pub control_channel_capacity: usize,
}

impl Default for InMemoryQueueConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 10000,
            result_expires_seconds: 86400,
            cleanup_interval_seconds: 300,
            control_channel_capacity: 256,
        }
    }
}

impl InMemoryQueueConfig {
    fn retention(&self) -> TimeDelta {
        i64::try_from(self.result_expires_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }
}

impl From<&WorkerConfig> for InMemoryQueueConfig {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            max_queue_size: config.max_queue_size,
            result_expires_seconds: config.result_expires_seconds,
            cleanup_interval_seconds: config.cleanup_interval_seconds,
            ..Self::default()
        }
    }
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::with_config(InMemoryQueueConfig::default())
    }

    pub fn with_config(config: InMemoryQueueConfig) -> Self {
        info!("Creating in-memory job queue with config: {:?}", config);
        let (sender, receiver) = mpsc::unbounded_channel();
        let (control_tx, _) = broadcast::channel(config.control_channel_capacity.max(1));

        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            sender: RwLock::new(Some(sender)),
            receiver: Mutex::new(receiver),
            control_tx,
            closed: AtomicBool::new(false),
            config,
            cleanup_handle: std::sync::Mutex::new(None),
        }
    }

    /// 启动过期结果清理任务，需要在 Tokio 运行时中调用
    pub fn start_cleanup_task(&self) {
        if self.config.cleanup_interval_seconds == 0 {
            return;
        }

        let jobs = Arc::clone(&self.jobs);
        let retention = self.config.retention();
        let period = Duration::from_secs(self.config.cleanup_interval_seconds);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let removed = Self::purge_before(&jobs, Utc::now(), retention).await;
                if removed > 0 {
                    info!("Purged {} expired job results", removed);
                }
            }
        });

        match self.cleanup_handle.lock() {
            Ok(mut guard) => {
                if let Some(previous) = guard.replace(handle) {
                    previous.abort();
                }
            }
            Err(_) => {
                warn!("Cleanup handle lock poisoned, stopping new cleanup task");
                handle.abort();
            }
        }
    }

    /// 清理在 `now` 时刻已超过保留期的终态结果，返回清理数量
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        Self::purge_before(&self.jobs, now, self.config.retention()).await
    }

    async fn purge_before(
        jobs: &RwLock<HashMap<String, JobInfo>>,
        now: DateTime<Utc>,
        retention: TimeDelta,
    ) -> usize {
        // 保留期早于可表示的最早时间时没有可清理的结果
        let Some(cutoff) = now.checked_sub_signed(retention) else {
            return 0;
        };

        let mut jobs = jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, info| match info.finished_at {
            Some(finished_at) if info.is_finished() => finished_at > cutoff,
            _ => true,
        });
        before - jobs.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InMemoryJobQueue {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.cleanup_handle.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn submit(&self, kind: JobKind) -> BulkqResult<String> {
        if self.is_closed() {
            return Err(BulkqError::MessageQueue("任务队列已关闭".to_string()));
        }

        let job_id = Uuid::new_v4().to_string();
        {
            let mut jobs = self.jobs.write().await;
            let active = jobs.values().filter(|info| !info.is_finished()).count();
            if active >= self.config.max_queue_size {
                warn!(
                    "Job queue is full ({}/{}), rejecting {} job",
                    active,
                    self.config.max_queue_size,
                    kind.name()
                );
                return Err(BulkqError::MessageQueue(format!(
                    "任务队列已满: {}/{}",
                    active, self.config.max_queue_size
                )));
            }
            jobs.insert(job_id.clone(), JobInfo::new(job_id.clone(), kind.clone()));
        }

        let sent = match self.sender.read().await.as_ref() {
            Some(sender) => sender
                .send(JobExecutionMessage::new(job_id.clone(), kind))
                .is_ok(),
            None => false,
        };

        if !sent {
            self.jobs.write().await.remove(&job_id);
            return Err(BulkqError::MessageQueue("任务队列已关闭".to_string()));
        }

        debug!("Submitted job {}", job_id);
        Ok(job_id)
    }

    async fn status(&self, job_id: &str) -> BulkqResult<JobStatus> {
        let jobs = self.jobs.read().await;
        Ok(jobs
            .get(job_id)
            .map(|info| info.status)
            .unwrap_or(JobStatus::Unknown))
    }

    async fn job_info(&self, job_id: &str) -> BulkqResult<Option<JobInfo>> {
        Ok(self.jobs.read().await.get(job_id).cloned())
    }

    async fn revoke(&self, job_id: &str, terminate: bool) -> BulkqResult<bool> {
        let revoked = {
            let mut jobs = self.jobs.write().await;
            match jobs.get_mut(job_id) {
                Some(info) if info.status == JobStatus::Pending => {
                    info.finish(JobStatus::Revoked, None)
                }
                // 运行中的任务由 worker 中止后写入 REVOKED，先提交完成的保持 SUCCESS
                Some(info) if info.status == JobStatus::Started && terminate => true,
                Some(info) => {
                    debug!(
                        "Job {} is {}, revoke (terminate={}) is a no-op",
                        job_id, info.status, terminate
                    );
                    false
                }
                None => {
                    debug!("Job {} is unknown, revoke is a no-op", job_id);
                    false
                }
            }
        };

        if revoked && terminate {
            // 没有订阅者时发送失败，可以忽略
            let _ = self
                .control_tx
                .send(JobControlMessage::revoke(job_id, terminate));
        }

        Ok(revoked)
    }

    async fn stats(&self) -> BulkqResult<JobStats> {
        let jobs = self.jobs.read().await;
        let mut stats = JobStats::default();
        for info in jobs.values() {
            stats.record(info.status);
        }
        Ok(stats)
    }
}

#[async_trait]
impl JobBroker for InMemoryJobQueue {
    async fn receive(&self) -> Option<(String, JobKind)> {
        let mut receiver = self.receiver.lock().await;
        receiver
            .recv()
            .await
            .map(|message| (message.job_id, message.kind))
    }

    fn subscribe_control(&self) -> broadcast::Receiver<JobControlMessage> {
        self.control_tx.subscribe()
    }

    async fn mark_started(&self, job_id: &str) -> BulkqResult<bool> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(job_id) {
            Some(info) => Ok(info.start()),
            None => Err(BulkqError::JobNotFound {
                id: job_id.to_string(),
            }),
        }
    }

    async fn mark_finished(
        &self,
        job_id: &str,
        status: JobStatus,
        error: Option<String>,
    ) -> BulkqResult<bool> {
        if !status.is_terminal() {
            return Err(BulkqError::InvalidJobParams(format!(
                "{status} 不是终态"
            )));
        }

        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(job_id) {
            Some(info) => Ok(info.finish(status, error)),
            None => Err(BulkqError::JobNotFound {
                id: job_id.to_string(),
            }),
        }
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.sender.write().await.take();
        info!("In-memory job queue closed");
    }
}
