use thiserror::Error;

/// 操作日志错误
#[derive(Debug, Error)]
pub enum OpLogError {
    /// 存储层失败（连接、SQL 执行），不自动重试
    #[error("failed to write op log: {0}")]
    Storage(#[source] anyhow::Error),

    /// 前后数据不是对象结构，未触达存储
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl From<tokio::task::JoinError> for OpLogError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Storage(e.into())
    }
}
