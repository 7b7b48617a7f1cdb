//! 评论表读写

use anyhow::Result;
use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::common::{format_timestamp, PageQuery, Paginated};
use crate::db::get_timestamp;

use super::model::Comment;

const COLUMNS: &str = "id, created_at, updated_at, biz_type, biz_id, content, author, parent_id";

fn row_to_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        created_at: get_timestamp(row, 1)?,
        updated_at: get_timestamp(row, 2)?,
        biz_type: row.get(3)?,
        biz_id: row.get(4)?,
        content: row.get(5)?,
        author: row.get(6)?,
        parent_id: row.get(7)?,
    })
}

pub fn find(conn: &Connection, id: i64) -> Result<Option<Comment>> {
    let sql = format!("SELECT {} FROM comment WHERE id = ?1", COLUMNS);
    Ok(conn.query_row(&sql, [id], row_to_comment).optional()?)
}

pub struct CommentFilter {
    pub biz_type: String,
    pub biz_id: String,
    pub author: Option<String>,
    pub parent_id: Option<i64>,
}

/// 最新优先
pub fn list(conn: &Connection, filter: &CommentFilter, page: PageQuery) -> Result<Paginated<Comment>> {
    let mut conditions = vec!["biz_type = ?1".to_string(), "biz_id = ?2".to_string()];
    let mut params: Vec<Box<dyn ToSql>> = vec![
        Box::new(filter.biz_type.clone()),
        Box::new(filter.biz_id.clone()),
    ];

    if let Some(author) = filter.author.as_deref().filter(|s| !s.is_empty()) {
        params.push(Box::new(author.to_string()));
        conditions.push(format!("author = ?{}", params.len()));
    }
    if let Some(parent_id) = filter.parent_id {
        params.push(Box::new(parent_id));
        conditions.push(format!("parent_id = ?{}", params.len()));
    }
    let where_clause = conditions.join(" AND ");

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM comment WHERE {}", where_clause),
        rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
        |row| row.get(0),
    )?;
    if total == 0 {
        return Ok(Paginated::empty());
    }

    params.push(Box::new(page.limit()));
    params.push(Box::new(page.offset()));
    let sql = format!(
        "SELECT {} FROM comment WHERE {} ORDER BY created_at DESC, id DESC LIMIT ?{} OFFSET ?{}",
        COLUMNS,
        where_clause,
        params.len() - 1,
        params.len()
    );
    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(
            rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
            row_to_comment,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Paginated {
        total: total as u64,
        items,
    })
}

pub fn insert(conn: &Connection, comment: &Comment) -> Result<Comment> {
    conn.execute(
        "INSERT INTO comment (created_at, updated_at, biz_type, biz_id, content, author, parent_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            format_timestamp(&comment.created_at),
            format_timestamp(&comment.updated_at),
            comment.biz_type,
            comment.biz_id,
            comment.content,
            comment.author,
            comment.parent_id,
        ],
    )?;
    Ok(Comment {
        id: conn.last_insert_rowid(),
        ..comment.clone()
    })
}

pub fn update_content(conn: &Connection, comment: &Comment) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE comment SET content = ?2, updated_at = ?3 WHERE id = ?1",
        rusqlite::params![
            comment.id,
            comment.content,
            format_timestamp(&comment.updated_at)
        ],
    )?;
    Ok(updated > 0)
}

pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
    Ok(conn.execute("DELETE FROM comment WHERE id = ?1", [id])? > 0)
}
