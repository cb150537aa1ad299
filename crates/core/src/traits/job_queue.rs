use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{
    models::{JobControlMessage, JobInfo, JobKind, JobStats, JobStatus},
    Result,
};

/// 提交方使用的任务队列接口
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// 提交任务，返回分配的任务 id；被接受即返回，不等待执行
    async fn submit(&self, kind: JobKind) -> Result<String>;

    /// 查询任务状态，没有记录时返回 [`JobStatus::Unknown`]
    async fn status(&self, job_id: &str) -> Result<JobStatus>;

    /// 查询任务详情
    async fn job_info(&self, job_id: &str) -> Result<Option<JobInfo>>;

    /// 撤销任务。等待中的任务立即变为 REVOKED；`terminate` 为 true 时
    /// 通知 worker 中止正在执行的任务，由 worker 在中止后写入 REVOKED。
    /// 未知或已处于终态的任务不做任何改变并返回 false。
    async fn revoke(&self, job_id: &str, terminate: bool) -> Result<bool>;

    /// 各状态任务数统计
    async fn stats(&self) -> Result<JobStats>;
}

/// worker 侧使用的队列接口
#[async_trait]
pub trait JobBroker: JobQueue {
    /// 取出下一个任务；队列关闭后返回 None
    async fn receive(&self) -> Option<(String, JobKind)>;

    /// 订阅撤销等控制消息
    fn subscribe_control(&self) -> broadcast::Receiver<JobControlMessage>;

    /// PENDING -> STARTED，状态不是 PENDING 时返回 false
    async fn mark_started(&self, job_id: &str) -> Result<bool>;

    /// 写入终态；任务已处于终态时返回 false
    async fn mark_finished(
        &self,
        job_id: &str,
        status: JobStatus,
        error: Option<String>,
    ) -> Result<bool>;

    /// 关闭队列，之后 `receive` 返回 None
    async fn close(&self);
}
