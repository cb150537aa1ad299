//! # Bulkq Core
//!
//! 批量写入任务队列的核心定义：数据模型、存储与队列接口、随机记录生成、
//! 配置和统一错误类型。具体实现位于 `bulkq-infrastructure`，
//! 任务执行位于 `bulkq-worker`。

pub mod config;
pub mod errors;
pub mod models;
pub mod random;
pub mod traits;

pub use errors::*;
pub use models::{
    JobControlAction, JobControlMessage, JobExecutionMessage, JobInfo, JobKind, JobStats,
    JobStatus, NewRecord, Record,
};
pub use traits::{JobBroker, JobQueue, RecordSource, RecordStore};

/// 统一的Result类型
pub type BulkqResult<T> = std::result::Result<T, BulkqError>;
