//! 操作日志数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 操作结果
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OpResult {
    Success,
    Failure,
}

impl OpResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(Self::Success),
            "failure" => Some(Self::Failure),
            _ => None,
        }
    }
}

/// 被操作对象
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub object_type: String,
    pub object_id: String,
}

impl ObjectInfo {
    pub fn new(object_type: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: object_id.into(),
        }
    }
}

/// 持久化的操作日志
///
/// 描述字段完全相同的事件合并为一行，`times` 记录发生次数，
/// `timestamp` 为最近一次发生时间
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OpLog {
    pub id: String,
    pub object_type: String,
    pub object_id: String,
    pub operation: String,
    pub result: OpResult,
    pub description: Option<String>,
    /// 规范化 JSON
    pub new_data: Option<String>,
    /// 规范化 JSON
    pub old_data: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub user: Option<String>,
    pub ip: Option<String>,
    pub times: u32,
}

/// 待写入的操作事件
#[derive(Debug, Clone)]
pub struct OpLogData {
    pub object: ObjectInfo,
    pub operation: String,
    pub description: Option<String>,
    pub result: OpResult,
    pub user: Option<String>,
    pub ip: Option<String>,
    pub new_data: Option<Value>,
    pub old_data: Option<Value>,
}

/// 去重匹配条件：所有描述字段精确相等，None 只匹配 NULL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpLogFilter {
    pub object_type: String,
    pub object_id: String,
    pub operation: String,
    pub result: OpResult,
    pub description: Option<String>,
    pub user: Option<String>,
    pub ip: Option<String>,
    pub new_data: Option<String>,
    pub old_data: Option<String>,
}

impl OpLogFilter {
    /// 按当前条件构造一条新记录
    pub fn to_record(&self, id: String, timestamp: DateTime<Utc>) -> OpLog {
        OpLog {
            id,
            object_type: self.object_type.clone(),
            object_id: self.object_id.clone(),
            operation: self.operation.clone(),
            result: self.result,
            description: self.description.clone(),
            new_data: self.new_data.clone(),
            old_data: self.old_data.clone(),
            timestamp,
            user: self.user.clone(),
            ip: self.ip.clone(),
            times: 1,
        }
    }
}
