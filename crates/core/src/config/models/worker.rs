use serde::{Deserialize, Serialize};

/// 结果保留时间上限：十年
pub const MAX_RESULT_EXPIRES_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Worker pool and job tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkerConfig {
    /// 同时执行的任务数
    pub concurrency: usize,
    /// 未结束任务的上限，超过后拒绝提交
    pub max_queue_size: usize,
    /// 终态结果保留时间，过期后状态查询返回 UNKNOWN
    pub result_expires_seconds: u64,
    /// 过期结果清理间隔，0 表示不启动清理任务
    pub cleanup_interval_seconds: u64,
    /// 关闭时等待运行中任务的时间，超时后强制中止
    pub shutdown_grace_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            max_queue_size: 10000,
            result_expires_seconds: 86400,
            cleanup_interval_seconds: 300,
            shutdown_grace_seconds: 30,
        }
    }
}

impl WorkerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.concurrency == 0 {
            return Err(anyhow::anyhow!("Worker并发数必须大于0"));
        }

        if self.max_queue_size == 0 {
            return Err(anyhow::anyhow!("队列容量必须大于0"));
        }

        if self.result_expires_seconds == 0 {
            return Err(anyhow::anyhow!("结果保留时间必须大于0"));
        }

        if self.result_expires_seconds > MAX_RESULT_EXPIRES_SECONDS {
            return Err(anyhow::anyhow!(
                "结果保留时间不能超过 {} 秒",
                MAX_RESULT_EXPIRES_SECONDS
            ));
        }

        Ok(())
    }
}
