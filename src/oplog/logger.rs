//! 业务侧操作日志记录器
//!
//! 绑定对象类型，从请求上下文补齐操作人和 IP

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::server::scope::RequestScope;

use super::error::OpLogError;
use super::model::{ObjectInfo, OpLog, OpLogData, OpResult};
use super::service::OpLogService;

/// 一次操作的日志内容
#[derive(Debug, Clone)]
pub struct LogData {
    object_id: String,
    operation: String,
    description: Option<String>,
    old_data: Option<Value>,
    new_data: Option<Value>,
    payload_error: Option<String>,
}

impl LogData {
    pub fn new(object_id: impl ToString, operation: impl Into<String>) -> Self {
        Self {
            object_id: object_id.to_string(),
            operation: operation.into(),
            description: None,
            old_data: None,
            new_data: None,
            payload_error: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn old_data<T: Serialize + ?Sized>(mut self, data: &T) -> Self {
        self.old_data = self.capture(data);
        self
    }

    pub fn new_data<T: Serialize + ?Sized>(mut self, data: &T) -> Self {
        self.new_data = self.capture(data);
        self
    }

    fn capture<T: Serialize + ?Sized>(&mut self, data: &T) -> Option<Value> {
        match serde_json::to_value(data) {
            Ok(value) => Some(value),
            Err(e) => {
                self.payload_error = Some(e.to_string());
                None
            }
        }
    }
}

/// 按对象类型记录操作日志
#[derive(Clone)]
pub struct OpLogger {
    object_type: &'static str,
    service: Arc<OpLogService>,
}

impl OpLogger {
    pub fn new(object_type: &'static str, service: Arc<OpLogService>) -> Self {
        Self {
            object_type,
            service,
        }
    }

    /// 记录成功操作，写入失败只打印警告
    pub async fn success(&self, scope: &RequestScope, data: LogData) {
        self.record_quietly(scope, data, OpResult::Success).await
    }

    /// 记录失败操作，写入失败只打印警告
    pub async fn failure(&self, scope: &RequestScope, data: LogData) {
        self.record_quietly(scope, data, OpResult::Failure).await
    }

    async fn record_quietly(&self, scope: &RequestScope, data: LogData, result: OpResult) {
        let object_id = data.object_id.clone();
        let operation = data.operation.clone();
        if let Err(e) = self.record(scope, data, result).await {
            tracing::warn!(
                object_type = self.object_type,
                object_id = %object_id,
                operation = %operation,
                "写入操作日志失败: {}",
                e
            );
        }
    }

    /// 记录一次操作，补齐操作人和客户端 IP
    async fn record(
        &self,
        scope: &RequestScope,
        data: LogData,
        result: OpResult,
    ) -> Result<OpLog, OpLogError> {
        if let Some(e) = data.payload_error {
            return Err(OpLogError::InvalidPayload(e));
        }
        self.service
            .create(OpLogData {
                object: ObjectInfo::new(self.object_type, data.object_id),
                operation: data.operation,
                description: data.description,
                result,
                user: scope.user_email().map(str::to_string),
                ip: scope.client_ip.clone(),
                new_data: data.new_data,
                old_data: data.old_data,
            })
            .await
    }
}
