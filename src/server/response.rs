//! 统一响应结构

use axum::{http::StatusCode, response::Json};
use serde::Serialize;

/// `{success, code, data, message}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: u16,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            code: StatusCode::OK.as_u16(),
            data: Some(data),
            message: None,
        }
    }

    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: status.as_u16(),
            data: None,
            message: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    /// 无数据的成功响应
    pub fn empty() -> Self {
        Self {
            success: true,
            code: StatusCode::OK.as_u16(),
            data: None,
            message: None,
        }
    }
}

/// 成功响应
pub fn success<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok(data))
}
