use async_trait::async_trait;

use crate::{
    models::{NewRecord, Record},
    Result,
};

/// 按序号生成待写入记录，序号从 0 开始
pub type RecordSource<'a> = dyn Fn(u64) -> NewRecord + Send + Sync + 'a;

/// 记录存储抽象接口
///
/// 表是共享的可变资源，一致性完全交给存储引擎的事务保证，
/// 实现方不做进程内加锁。
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 在单个事务中写入 `count` 条由 `next_record` 生成的记录，
    /// 全部提交或全部回滚，返回写入条数。
    ///
    /// 记录按分块生成并写入，内存占用与 `count` 无关。
    async fn insert_batch(&self, count: u64, next_record: &RecordSource) -> Result<u64>;

    /// 记录总数
    async fn count(&self) -> Result<i64>;

    /// 按 id 升序返回所有记录
    async fn list_all(&self) -> Result<Vec<Record>>;

    /// 在事务中清空记录表，返回删除的行数
    async fn delete_all(&self) -> Result<u64>;

    /// 存储连通性检查
    async fn ping(&self) -> Result<()>;
}
