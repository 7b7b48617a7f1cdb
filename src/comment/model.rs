//! 评论数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::PageQuery;

/// 评论挂在任意业务对象 `(biz_type, biz_id)` 下，可回复其他评论
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub biz_type: String,
    pub biz_id: String,
    pub content: String,
    pub author: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub biz_type: String,
    pub biz_id: String,
    pub content: String,
    /// 未登录时必填
    pub author: Option<String>,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// `GET /api/comments` 查询参数
#[derive(Debug, Default, Deserialize)]
pub struct CommentListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub biz_type: Option<String>,
    pub biz_id: Option<String>,
    pub author: Option<String>,
    pub parent_id: Option<i64>,
}

impl CommentListQuery {
    pub fn page(&self) -> PageQuery {
        let default = PageQuery::default();
        PageQuery {
            page: self.page.unwrap_or(default.page),
            page_size: self.page_size.unwrap_or(default.page_size),
        }
    }
}

fn validate_content(content: &str) -> Result<(), String> {
    let len = content.trim().chars().count();
    if len == 0 || len > 2000 {
        return Err("content must be between 1 and 2000 characters".to_string());
    }
    Ok(())
}

impl CreateCommentRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.biz_type.trim().is_empty() || self.biz_id.trim().is_empty() {
            return Err("biz_type and biz_id are required".to_string());
        }
        validate_content(&self.content)
    }
}

impl UpdateCommentRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_content(&self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_validation() {
        let req: CreateCommentRequest =
            serde_json::from_str(r#"{"biz_type":"article","biz_id":"1","content":"nice"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.author.is_none());

        let blank: CreateCommentRequest =
            serde_json::from_str(r#"{"biz_type":"","biz_id":"1","content":"nice"}"#).unwrap();
        assert!(blank.validate().is_err());

        assert!(UpdateCommentRequest { content: " ".into() }.validate().is_err());
    }
}
