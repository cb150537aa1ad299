use serde::{Deserialize, Serialize};

/// 已持久化的合成记录
///
/// 只能由批量写入任务创建，只能通过整表清空删除，创建后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Record {
    pub id: i64,
    pub field1: String,
    pub field2: String,
}

/// 待写入的记录，`id` 由存储层分配
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub field1: String,
    pub field2: String,
}

impl NewRecord {
    pub fn new(field1: impl Into<String>, field2: impl Into<String>) -> Self {
        Self {
            field1: field1.into(),
            field2: field2.into(),
        }
    }
}
