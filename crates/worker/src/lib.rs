//! # Bulkq Worker
//!
//! 任务执行层：批量写入与撤销两类任务的实现，以及消费队列、
//! 限制并发、响应强制终止的 [`WorkerService`]。

pub mod executors;
pub mod metrics;
pub mod service;

pub use executors::{run_bulk_insert, run_cancel, JobExecutor};
pub use service::{WorkerService, WorkerServiceConfig};
