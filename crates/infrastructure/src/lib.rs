//! # Bulkq Infrastructure
//!
//! 存储与队列的具体实现：
//! - `database`：基于 sqlx 的 SQLite / PostgreSQL 记录存储与建表
//! - `in_memory_queue`：进程内任务队列与状态跟踪器

pub mod database;
pub mod in_memory_queue;

pub use database::{DatabaseManager, DatabasePool, DatabaseType};
pub use in_memory_queue::{InMemoryJobQueue, InMemoryQueueConfig};
