//! 文章数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::PageQuery;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Article {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub content: String,
    /// 作者邮箱
    pub author: String,
    pub category: Option<String>,
    pub tags: Option<String>,
    pub likes: i64,
    pub dislikes: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<String>,
}

/// 点赞/点踩动作
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LikeAction {
    Like,
    Unlike,
    Dislike,
    Undislike,
}

impl LikeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Unlike => "unlike",
            Self::Dislike => "dislike",
            Self::Undislike => "undislike",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    pub action: LikeAction,
}

/// `GET /api/articles` 查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ArticleListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// 标题或正文模糊匹配
    pub search: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
}

impl ArticleListQuery {
    pub fn page(&self) -> PageQuery {
        let default = PageQuery::default();
        PageQuery {
            page: self.page.unwrap_or(default.page),
            page_size: self.page_size.unwrap_or(default.page_size),
        }
    }
}

fn validate_title(title: &str) -> Result<(), String> {
    let len = title.trim().chars().count();
    if len == 0 || len > 200 {
        return Err("title must be between 1 and 200 characters".to_string());
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), String> {
    if content.trim().is_empty() {
        return Err("content must not be empty".to_string());
    }
    Ok(())
}

fn validate_category(category: Option<&str>) -> Result<(), String> {
    if category.is_some_and(|c| c.chars().count() > 64) {
        return Err("category must be at most 64 characters".to_string());
    }
    Ok(())
}

impl CreateArticleRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        validate_content(&self.content)?;
        validate_category(self.category.as_deref())
    }
}

impl UpdateArticleRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(content) = &self.content {
            validate_content(content)?;
        }
        validate_category(self.category.as_deref())
    }

    /// 应用到已有文章上
    pub fn apply(self, article: &mut Article) {
        if let Some(title) = self.title {
            article.title = title.trim().to_string();
        }
        if let Some(content) = self.content {
            article.content = content;
        }
        if let Some(category) = self.category {
            article.category = Some(category).filter(|c| !c.is_empty());
        }
        if let Some(tags) = self.tags {
            article.tags = Some(tags).filter(|t| !t.is_empty());
        }
    }
}
