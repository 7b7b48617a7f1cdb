//! 操作日志
//!
//! 记录业务对象上的操作，相同事件合并计数，按对象分页查询

mod error;
mod handlers;
pub mod logger;
pub mod model;
mod router;
pub mod service;
pub mod store;
mod types;

pub use error::OpLogError;
pub use logger::{LogData, OpLogger};
pub use router::router;
pub use service::OpLogService;
pub use store::SqliteOpLogStore;
