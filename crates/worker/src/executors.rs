use std::sync::Arc;

use bulkq_core::{random, traits::JobQueue, BulkqResult, JobKind, RecordStore};
use tracing::{error, info};

use crate::metrics;

pub const INSERT_SUCCESS_MESSAGE: &str = "Data successfully inserted into database";
pub const INSERT_ROLLBACK_MESSAGE: &str = "Rollback successfully, data not inserted into database";
pub const REVOKE_INITIATED_MESSAGE: &str = "Request to revoke and rollback initiated";

/// 批量写入：生成 `count` 条随机记录并在单个事务中提交
///
/// 记录随写入按分块生成。任何存储错误都会回滚整个事务并原样返回，不自动重试。
pub async fn run_bulk_insert(store: &dyn RecordStore, count: u64) -> BulkqResult<u64> {
    match store.insert_batch(count, &random::random_record).await {
        Ok(inserted) => {
            metrics::record_records_inserted(inserted);
            info!(count = inserted, "{}", INSERT_SUCCESS_MESSAGE);
            Ok(inserted)
        }
        Err(e) => {
            error!(count, error = %e, "{}", INSERT_ROLLBACK_MESSAGE);
            Err(e)
        }
    }
}

/// 撤销目标任务并强制终止其执行
///
/// 本身不做数据库操作，未提交的写入随被中止任务的事务一起回滚。
/// 无论撤销是否生效都会记录发起日志。
pub async fn run_cancel(queue: &dyn JobQueue, target_job_id: &str) -> BulkqResult<bool> {
    let result = queue.revoke(target_job_id, true).await;
    info!(target_job_id, "{}", REVOKE_INITIATED_MESSAGE);
    result
}

/// 按任务种类分发执行
#[derive(Clone)]
pub struct JobExecutor {
    store: Arc<dyn RecordStore>,
    queue: Arc<dyn JobQueue>,
}

impl JobExecutor {
    pub fn new(store: Arc<dyn RecordStore>, queue: Arc<dyn JobQueue>) -> Self {
        Self { store, queue }
    }

    pub async fn execute(&self, job_id: &str, kind: &JobKind) -> BulkqResult<()> {
        match kind {
            JobKind::Insert { count } => {
                info!(job_id, count, "开始执行批量写入任务");
                run_bulk_insert(self.store.as_ref(), *count).await?;
            }
            JobKind::Cancel { target_job_id } => {
                info!(job_id, target_job_id = %target_job_id, "开始执行撤销任务");
                run_cancel(self.queue.as_ref(), target_job_id).await?;
            }
        }
        Ok(())
    }
}
