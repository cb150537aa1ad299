pub mod manager;
pub mod postgres;
pub mod sqlite;

pub use manager::{DatabaseManager, DatabasePool, DatabaseType};
pub use postgres::PostgresRecordStore;
pub use sqlite::SqliteRecordStore;

/// 单条 INSERT 语句携带的记录数，两列共 2000 个绑定参数
pub const INSERT_CHUNK_SIZE: usize = 1000;
