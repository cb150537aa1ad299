use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::job::JobKind;

/// 队列中传递的任务执行消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobExecutionMessage {
    pub job_id: String,
    pub kind: JobKind,
    pub timestamp: DateTime<Utc>,
}

impl JobExecutionMessage {
    pub fn new(job_id: String, kind: JobKind) -> Self {
        Self {
            job_id,
            kind,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobControlAction {
    Revoke,
}

/// 广播给所有 worker 的控制消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobControlMessage {
    pub job_id: String,
    pub action: JobControlAction,
    /// 为 true 时正在执行的任务会被立即中止
    pub terminate: bool,
    pub timestamp: DateTime<Utc>,
}

impl JobControlMessage {
    pub fn revoke(job_id: impl Into<String>, terminate: bool) -> Self {
        Self {
            job_id: job_id.into(),
            action: JobControlAction::Revoke,
            terminate,
            timestamp: Utc::now(),
        }
    }
}
