use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bulkq_core::{
    config::DatabaseConfig, BulkqError, BulkqResult, JobBroker, JobKind, JobQueue, JobStatus,
    Record, RecordSource, RecordStore,
};
use bulkq_infrastructure::{DatabaseManager, InMemoryJobQueue};
use bulkq_worker::{JobExecutor, WorkerService, WorkerServiceConfig};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

struct TestWorker {
    queue: Arc<InMemoryJobQueue>,
    store: Arc<dyn RecordStore>,
    service: Arc<WorkerService>,
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<BulkqResult<()>>,
}

impl TestWorker {
    async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}

async fn memory_store() -> Arc<dyn RecordStore> {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        ..DatabaseConfig::default()
    };
    let manager = DatabaseManager::new(&config).await.unwrap();
    manager.migrate().await.unwrap();
    manager.record_store()
}

fn start_worker(
    queue: Arc<InMemoryJobQueue>,
    store: Arc<dyn RecordStore>,
    concurrency: usize,
) -> TestWorker {
    let executor = JobExecutor::new(Arc::clone(&store), queue.clone());
    let service = Arc::new(WorkerService::new(
        queue.clone(),
        executor,
        WorkerServiceConfig {
            concurrency,
            shutdown_grace: Duration::from_secs(1),
        },
    ));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let runner = Arc::clone(&service);
    let handle = tokio::spawn(async move { runner.run(shutdown_rx).await });

    TestWorker {
        queue,
        store,
        service,
        shutdown_tx,
        handle,
    }
}

async fn wait_for_status<F>(queue: &InMemoryJobQueue, job_id: &str, done: F) -> JobStatus
where
    F: Fn(JobStatus) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let status = queue.status(job_id).await.unwrap();
        if done(status) {
            return status;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {job_id} stuck in {status}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

async fn wait_for_terminal(queue: &InMemoryJobQueue, job_id: &str) -> JobStatus {
    wait_for_status(queue, job_id, |status| status.is_terminal()).await
}

/// 写入总是失败的存储
struct FailingStore;

#[async_trait]
impl RecordStore for FailingStore {
    async fn insert_batch(&self, _count: u64, _next: &RecordSource) -> BulkqResult<u64> {
        Err(BulkqError::Storage(sqlx::Error::PoolTimedOut))
    }

    async fn count(&self) -> BulkqResult<i64> {
        Ok(0)
    }

    async fn list_all(&self) -> BulkqResult<Vec<Record>> {
        Ok(Vec::new())
    }

    async fn delete_all(&self) -> BulkqResult<u64> {
        Ok(0)
    }

    async fn ping(&self) -> BulkqResult<()> {
        Ok(())
    }
}

/// 写入前会等待的存储，用于观察执行中的任务
#[derive(Default)]
struct SlowStore {
    delay: Duration,
    committed: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    entered: AtomicBool,
}

impl SlowStore {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

#[async_trait]
impl RecordStore for SlowStore {
    async fn insert_batch(&self, count: u64, _next: &RecordSource) -> BulkqResult<u64> {
        self.entered.store(true, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.committed.fetch_add(count as usize, Ordering::SeqCst);
        Ok(count)
    }

    async fn count(&self) -> BulkqResult<i64> {
        Ok(self.committed.load(Ordering::SeqCst) as i64)
    }

    async fn list_all(&self) -> BulkqResult<Vec<Record>> {
        Ok(Vec::new())
    }

    async fn delete_all(&self) -> BulkqResult<u64> {
        Ok(0)
    }

    async fn ping(&self) -> BulkqResult<()> {
        Ok(())
    }
}

/// 写入时 panic 的存储
struct PanickingStore;

#[async_trait]
impl RecordStore for PanickingStore {
    async fn insert_batch(&self, count: u64, _next: &RecordSource) -> BulkqResult<u64> {
        panic!("cannot insert {count} records");
    }

    async fn count(&self) -> BulkqResult<i64> {
        Ok(0)
    }

    async fn list_all(&self) -> BulkqResult<Vec<Record>> {
        Ok(Vec::new())
    }

    async fn delete_all(&self) -> BulkqResult<u64> {
        Ok(0)
    }

    async fn ping(&self) -> BulkqResult<()> {
        Ok(())
    }
}

/// 包装真实存储，记录事务内已生成的记录数
struct TrackingStore {
    inner: Arc<dyn RecordStore>,
    generated: Arc<AtomicU64>,
}

#[async_trait]
impl RecordStore for TrackingStore {
    async fn insert_batch(&self, count: u64, next: &RecordSource) -> BulkqResult<u64> {
        let generated = Arc::clone(&self.generated);
        let tracked = move |i: u64| {
            generated.fetch_add(1, Ordering::SeqCst);
            next(i)
        };
        self.inner.insert_batch(count, &tracked).await
    }

    async fn count(&self) -> BulkqResult<i64> {
        self.inner.count().await
    }

    async fn list_all(&self) -> BulkqResult<Vec<Record>> {
        self.inner.list_all().await
    }

    async fn delete_all(&self) -> BulkqResult<u64> {
        self.inner.delete_all().await
    }

    async fn ping(&self) -> BulkqResult<()> {
        self.inner.ping().await
    }
}

async fn wait_until_idle(service: &WorkerService) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !service.running_jobs().await.is_empty() {
        assert!(tokio::time::Instant::now() < deadline, "jobs still running");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_insert_job_succeeds_and_adds_records() {
    let worker = start_worker(Arc::new(InMemoryJobQueue::new()), memory_store().await, 2);

    let id = worker.queue.submit(JobKind::Insert { count: 5 }).await.unwrap();
    assert_eq!(wait_for_terminal(&worker.queue, &id).await, JobStatus::Success);
    assert_eq!(worker.store.count().await.unwrap(), 5);

    let info = worker.queue.job_info(&id).await.unwrap().unwrap();
    assert!(info.started_at.is_some());
    assert!(info.finished_at.is_some());
    assert!(info.error.is_none());

    worker.stop().await;
}

#[tokio::test]
async fn test_zero_count_insert_succeeds() {
    let worker = start_worker(Arc::new(InMemoryJobQueue::new()), memory_store().await, 1);

    let id = worker.queue.submit(JobKind::Insert { count: 0 }).await.unwrap();
    assert_eq!(wait_for_terminal(&worker.queue, &id).await, JobStatus::Success);
    assert_eq!(worker.store.count().await.unwrap(), 0);

    worker.stop().await;
}

#[tokio::test]
async fn test_storage_failure_marks_job_failed() {
    let worker = start_worker(Arc::new(InMemoryJobQueue::new()), Arc::new(FailingStore), 1);

    let id = worker.queue.submit(JobKind::Insert { count: 10 }).await.unwrap();
    assert_eq!(wait_for_terminal(&worker.queue, &id).await, JobStatus::Failure);
    assert_eq!(worker.store.count().await.unwrap(), 0);

    let info = worker.queue.job_info(&id).await.unwrap().unwrap();
    assert!(info.error.unwrap().contains("存储错误"));

    worker.stop().await;
}

#[tokio::test]
async fn test_cancel_race_is_all_or_nothing() {
    let worker = start_worker(Arc::new(InMemoryJobQueue::new()), memory_store().await, 2);

    let insert_id = worker
        .queue
        .submit(JobKind::Insert { count: 1000 })
        .await
        .unwrap();
    let cancel_id = worker
        .queue
        .submit(JobKind::Cancel {
            target_job_id: insert_id.clone(),
        })
        .await
        .unwrap();

    assert_eq!(
        wait_for_terminal(&worker.queue, &cancel_id).await,
        JobStatus::Success
    );
    let status = wait_for_terminal(&worker.queue, &insert_id).await;
    assert!(
        matches!(status, JobStatus::Revoked | JobStatus::Success),
        "unexpected status {status}"
    );

    // 等待被中止的任务释放连接
    tokio::time::sleep(Duration::from_millis(100)).await;
    let count = worker.store.count().await.unwrap();
    assert!(count == 0 || count == 1000, "partial commit: {count}");
    if status == JobStatus::Success {
        assert_eq!(count, 1000);
    }

    worker.stop().await;
}

#[tokio::test]
async fn test_terminate_running_job_prevents_commit() {
    let store = Arc::new(SlowStore::with_delay(Duration::from_secs(5)));
    let worker = start_worker(Arc::new(InMemoryJobQueue::new()), store.clone(), 1);

    let id = worker.queue.submit(JobKind::Insert { count: 50 }).await.unwrap();
    wait_for_status(&worker.queue, &id, |status| status == JobStatus::Started).await;
    while !store.entered.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(worker.queue.revoke(&id, true).await.unwrap());
    assert_eq!(wait_for_terminal(&worker.queue, &id).await, JobStatus::Revoked);

    wait_until_idle(&worker.service).await;
    assert_eq!(store.committed.load(Ordering::SeqCst), 0);

    worker.stop().await;
}

#[tokio::test]
async fn test_terminate_rolls_back_real_transaction() {
    let generated = Arc::new(AtomicU64::new(0));
    let store: Arc<dyn RecordStore> = Arc::new(TrackingStore {
        inner: memory_store().await,
        generated: Arc::clone(&generated),
    });
    let worker = start_worker(Arc::new(InMemoryJobQueue::new()), store, 1);

    let id = worker
        .queue
        .submit(JobKind::Insert { count: u64::MAX })
        .await
        .unwrap();

    // 若干分块已经在未提交的事务中执行
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while generated.load(Ordering::SeqCst) < 5000 {
        assert!(tokio::time::Instant::now() < deadline, "insert never progressed");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let cancel_id = worker
        .queue
        .submit(JobKind::Cancel {
            target_job_id: id.clone(),
        })
        .await
        .unwrap();
    assert_eq!(
        wait_for_terminal(&worker.queue, &cancel_id).await,
        JobStatus::Success
    );
    assert_eq!(wait_for_terminal(&worker.queue, &id).await, JobStatus::Revoked);
    wait_until_idle(&worker.service).await;

    assert_eq!(worker.store.count().await.unwrap(), 0);

    // 唯一的内存连接回滚后仍可继续写入
    let next = worker.queue.submit(JobKind::Insert { count: 3 }).await.unwrap();
    assert_eq!(wait_for_terminal(&worker.queue, &next).await, JobStatus::Success);
    assert_eq!(worker.store.count().await.unwrap(), 3);

    worker.stop().await;
}

#[tokio::test]
async fn test_cancel_runs_while_all_permits_are_busy() {
    let store = Arc::new(SlowStore::with_delay(Duration::from_secs(30)));
    let worker = start_worker(Arc::new(InMemoryJobQueue::new()), store.clone(), 1);

    let running = worker.queue.submit(JobKind::Insert { count: 10 }).await.unwrap();
    wait_for_status(&worker.queue, &running, |status| status == JobStatus::Started).await;
    while !store.entered.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let cancel_id = worker
        .queue
        .submit(JobKind::Cancel {
            target_job_id: running.clone(),
        })
        .await
        .unwrap();
    assert_eq!(
        wait_for_terminal(&worker.queue, &cancel_id).await,
        JobStatus::Success
    );
    assert_eq!(
        wait_for_terminal(&worker.queue, &running).await,
        JobStatus::Revoked
    );
    assert_eq!(store.committed.load(Ordering::SeqCst), 0);

    worker.stop().await;
}

#[tokio::test]
async fn test_panicking_job_is_marked_failed() {
    let worker = start_worker(Arc::new(InMemoryJobQueue::new()), Arc::new(PanickingStore), 1);

    let id = worker
        .queue
        .submit(JobKind::Insert { count: u64::MAX })
        .await
        .unwrap();
    assert_eq!(wait_for_terminal(&worker.queue, &id).await, JobStatus::Failure);
    wait_until_idle(&worker.service).await;

    let info = worker.queue.job_info(&id).await.unwrap().unwrap();
    assert!(info.error.unwrap().contains("cannot insert"));
    assert_eq!(worker.queue.stats().await.unwrap().active(), 0);

    // worker 仍然可以处理后续任务
    let next = worker.queue.submit(JobKind::Insert { count: 1 }).await.unwrap();
    assert_eq!(wait_for_terminal(&worker.queue, &next).await, JobStatus::Failure);

    worker.stop().await;
}

#[tokio::test]
async fn test_revoked_pending_job_never_runs() {
    let queue = Arc::new(InMemoryJobQueue::new());
    let store = memory_store().await;

    let revoked = queue.submit(JobKind::Insert { count: 10 }).await.unwrap();
    assert!(queue.revoke(&revoked, false).await.unwrap());

    let worker = start_worker(queue, store, 1);
    let next = worker.queue.submit(JobKind::Insert { count: 1 }).await.unwrap();
    assert_eq!(wait_for_terminal(&worker.queue, &next).await, JobStatus::Success);

    assert_eq!(
        worker.queue.status(&revoked).await.unwrap(),
        JobStatus::Revoked
    );
    assert_eq!(worker.store.count().await.unwrap(), 1);

    worker.stop().await;
}

#[tokio::test]
async fn test_concurrency_limit_is_respected() {
    let store = Arc::new(SlowStore::with_delay(Duration::from_millis(50)));
    let worker = start_worker(Arc::new(InMemoryJobQueue::new()), store.clone(), 2);

    let mut ids = Vec::new();
    for _ in 0..6 {
        ids.push(worker.queue.submit(JobKind::Insert { count: 1 }).await.unwrap());
    }
    for id in &ids {
        assert_eq!(wait_for_terminal(&worker.queue, id).await, JobStatus::Success);
    }

    assert!(store.max_in_flight.load(Ordering::SeqCst) <= 2);
    assert_eq!(store.committed.load(Ordering::SeqCst), 6);

    worker.stop().await;
}

#[tokio::test]
async fn test_worker_stops_when_queue_closes() {
    let queue = Arc::new(InMemoryJobQueue::new());
    let worker = start_worker(queue.clone(), memory_store().await, 1);

    queue.close().await;
    let result = tokio::time::timeout(Duration::from_secs(5), worker.handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
