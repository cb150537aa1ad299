//! # 数据模型
//!
//! 记录、任务与队列消息的核心数据结构。
//!
//! ## 任务状态流转
//! ```text
//! PENDING → STARTED → SUCCESS
//!    ↓         ↓   ↘
//! REVOKED   REVOKED  FAILURE
//! ```
//!
//! 跟踪器中不存在的任务 id 报告为 `UNKNOWN`。

pub mod job;
pub mod message;
pub mod record;

pub use job::{JobInfo, JobKind, JobStats, JobStatus};
pub use message::{JobControlAction, JobControlMessage, JobExecutionMessage};
pub use record::{NewRecord, Record};
