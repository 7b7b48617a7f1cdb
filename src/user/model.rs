//! 用户数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::PageQuery;

/// 用户（不含密码）
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct User {
    pub email: String,
    pub name: String,
    pub birthdate: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 数据库中的用户及其密码哈希
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub birthdate: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub birthdate: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// `GET /api/users` 查询参数
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    /// 按邮箱或姓名模糊匹配
    pub search: Option<String>,
    /// 逗号分隔的邮箱列表
    pub emails: Option<String>,
}

impl UserListQuery {
    pub fn page(&self) -> PageQuery {
        let default = PageQuery::default();
        PageQuery {
            page: self.page.unwrap_or(default.page),
            page_size: self.page_size.unwrap_or(default.page_size),
        }
    }

    pub fn email_list(&self) -> Vec<String> {
        self.emails
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    let len = name.trim().chars().count();
    if len == 0 || len > 64 {
        return Err("name must be between 1 and 64 characters".to_string());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if !(6..=72).contains(&len) {
        return Err("password must be between 6 and 72 characters".to_string());
    }
    Ok(())
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !valid_email(&self.email) {
            return Err("invalid email address".to_string());
        }
        validate_name(&self.name)?;
        validate_password(&self.password)
    }
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        Ok(())
    }
}
