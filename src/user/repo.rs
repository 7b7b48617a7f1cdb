//! 用户表读写（同步，经 `Database::call` 调用）

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::common::{format_timestamp, PageQuery, Paginated};
use crate::db::get_timestamp;

use super::model::{User, UserRecord};

const COLUMNS: &str = "email, name, birthdate, created_at, updated_at, password";

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        user: User {
            email: row.get(0)?,
            name: row.get(1)?,
            birthdate: row.get(2)?,
            created_at: get_timestamp(row, 3)?,
            updated_at: get_timestamp(row, 4)?,
        },
        password: row.get(5)?,
    })
}

pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<UserRecord>> {
    let sql = format!("SELECT {} FROM user WHERE email = ?1", COLUMNS);
    let record = conn
        .query_row(&sql, [email], row_to_record)
        .optional()?;
    Ok(record)
}

pub fn list(
    conn: &Connection,
    search: Option<&str>,
    emails: &[String],
    page: PageQuery,
) -> Result<Paginated<User>> {
    let mut conditions: Vec<String> = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(search) = search.filter(|s| !s.is_empty()) {
        params.push(Box::new(format!("%{}%", search)));
        conditions.push(format!("(email LIKE ?{0} OR name LIKE ?{0})", params.len()));
    }
    if !emails.is_empty() {
        let mut placeholders = Vec::with_capacity(emails.len());
        for email in emails {
            params.push(Box::new(email.clone()));
            placeholders.push(format!("?{}", params.len()));
        }
        conditions.push(format!("email IN ({})", placeholders.join(", ")));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM user {}", where_clause),
        rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
        |row| row.get(0),
    )?;
    if total == 0 {
        return Ok(Paginated::empty());
    }

    params.push(Box::new(page.limit()));
    params.push(Box::new(page.offset()));
    let sql = format!(
        "SELECT {} FROM user {} ORDER BY created_at DESC, email ASC LIMIT ?{} OFFSET ?{}",
        COLUMNS,
        where_clause,
        params.len() - 1,
        params.len()
    );
    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(
            rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
            row_to_record,
        )?
        .map(|r| r.map(|record| record.user))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Paginated {
        total: total as u64,
        items,
    })
}

/// 插入用户；邮箱已存在时返回 false
pub fn insert(
    conn: &Connection,
    user: &User,
    password_hash: &str,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO user (email, name, password, birthdate, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            user.email,
            user.name,
            password_hash,
            user.birthdate,
            format_timestamp(&user.created_at),
            format_timestamp(&user.updated_at),
        ],
    )?;
    Ok(inserted > 0)
}

pub fn update_profile(conn: &Connection, user: &User) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE user SET name = ?2, birthdate = ?3, updated_at = ?4 WHERE email = ?1",
        rusqlite::params![
            user.email,
            user.name,
            user.birthdate,
            format_timestamp(&user.updated_at),
        ],
    )?;
    Ok(updated > 0)
}

pub fn update_password(
    conn: &Connection,
    email: &str,
    password_hash: &str,
    updated_at: &DateTime<Utc>,
) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE user SET password = ?2, updated_at = ?3 WHERE email = ?1",
        rusqlite::params![email, password_hash, format_timestamp(updated_at)],
    )?;
    Ok(updated > 0)
}

pub fn delete(conn: &Connection, email: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM user WHERE email = ?1", [email])?;
    Ok(deleted > 0)
}
