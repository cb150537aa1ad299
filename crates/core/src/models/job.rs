use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 任务种类，由 worker 按标签分发
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobKind {
    /// 生成 `count` 条随机记录并在单个事务中提交
    Insert { count: u64 },
    /// 强制终止目标任务
    Cancel { target_job_id: String },
}

impl JobKind {
    pub fn name(&self) -> &'static str {
        match self {
            JobKind::Insert { .. } => "insert",
            JobKind::Cancel { .. } => "cancel",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum JobStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "STARTED")]
    Started,
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILURE")]
    Failure,
    #[serde(rename = "REVOKED")]
    Revoked,
    /// 跟踪器中没有该任务的记录（从未提交或结果已过期）
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Started => "STARTED",
            JobStatus::Success => "SUCCESS",
            JobStatus::Failure => "FAILURE",
            JobStatus::Revoked => "REVOKED",
            JobStatus::Unknown => "UNKNOWN",
        }
    }

    /// SUCCESS / FAILURE / REVOKED 为终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Success | JobStatus::Failure | JobStatus::Revoked
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(JobStatus::Pending),
            "STARTED" => Ok(JobStatus::Started),
            "SUCCESS" => Ok(JobStatus::Success),
            "FAILURE" => Ok(JobStatus::Failure),
            "REVOKED" => Ok(JobStatus::Revoked),
            "UNKNOWN" => Ok(JobStatus::Unknown),
            _ => Err(format!("Invalid job status: {s}")),
        }
    }
}

/// 跟踪器保存的任务状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo {
    pub id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl JobInfo {
    pub fn new(id: String, kind: JobKind) -> Self {
        Self {
            id,
            kind,
            status: JobStatus::Pending,
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    /// PENDING -> STARTED，其他状态下返回 false
    pub fn start(&mut self) -> bool {
        if self.status != JobStatus::Pending {
            return false;
        }
        self.status = JobStatus::Started;
        self.started_at = Some(Utc::now());
        true
    }

    /// 进入终态；已经是终态的任务不再改变
    pub fn finish(&mut self, status: JobStatus, error: Option<String>) -> bool {
        if self.status.is_terminal() || !status.is_terminal() {
            return false;
        }
        self.status = status;
        self.finished_at = Some(Utc::now());
        self.error = error;
        true
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}

/// 跟踪器中各状态的任务数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    pub pending: usize,
    pub started: usize,
    pub success: usize,
    pub failure: usize,
    pub revoked: usize,
}

impl JobStats {
    pub fn record(&mut self, status: JobStatus) {
        match status {
            JobStatus::Pending => self.pending += 1,
            JobStatus::Started => self.started += 1,
            JobStatus::Success => self.success += 1,
            JobStatus::Failure => self.failure += 1,
            JobStatus::Revoked => self.revoked += 1,
            JobStatus::Unknown => {}
        }
    }

    /// 尚未进入终态的任务数
    pub fn active(&self) -> usize {
        self.pending + self.started
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Revoked).unwrap(),
            "\"REVOKED\""
        );
        assert_eq!(
            serde_json::from_str::<JobStatus>("\"UNKNOWN\"").unwrap(),
            JobStatus::Unknown
        );
        assert_eq!("success".parse::<JobStatus>().unwrap(), JobStatus::Success);
        assert!("DONE".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_job_kind_tagging() {
        let kind = JobKind::Cancel {
            target_job_id: "t-1".to_string(),
        };
        let value = serde_json::to_value(&kind).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"kind": "cancel", "target_job_id": "t-1"})
        );

        let parsed: JobKind = serde_json::from_str(r#"{"kind":"insert","count":5}"#).unwrap();
        assert_eq!(parsed, JobKind::Insert { count: 5 });
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut info = JobInfo::new("j".to_string(), JobKind::Insert { count: 1 });
        assert_eq!(info.status, JobStatus::Pending);
        assert!(!info.finish(JobStatus::Started, None));
        assert!(info.start());
        assert!(!info.start());
        assert!(info.finish(JobStatus::Revoked, None));
        // 已撤销的任务不能再变成成功
        assert!(!info.finish(JobStatus::Success, None));
        assert_eq!(info.status, JobStatus::Revoked);
        assert!(info.is_finished());
        assert!(info.finished_at.is_some());
    }

    #[test]
    fn test_terminal_states() {
        for status in [JobStatus::Success, JobStatus::Failure, JobStatus::Revoked] {
            assert!(status.is_terminal());
        }
        for status in [JobStatus::Pending, JobStatus::Started, JobStatus::Unknown] {
            assert!(!status.is_terminal());
        }
    }
}
