//! 服务配置
//!
//! 配置来源依次为内置默认值、TOML 配置文件、`BULKQ_` 前缀的环境变量，
//! 后者覆盖前者。嵌套字段在环境变量中用 `__` 分隔，例如
//! `BULKQ_WORKER__CONCURRENCY=8`。

pub mod models;


pub use models::*;
