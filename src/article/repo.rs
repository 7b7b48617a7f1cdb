//! 文章表读写

use anyhow::Result;
use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::common::{format_timestamp, PageQuery, Paginated};
use crate::db::get_timestamp;

use super::model::{Article, LikeAction};

const COLUMNS: &str =
    "id, created_at, updated_at, title, content, author, category, tags, likes, dislikes";

fn row_to_article(row: &Row<'_>) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        created_at: get_timestamp(row, 1)?,
        updated_at: get_timestamp(row, 2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        author: row.get(5)?,
        category: row.get(6)?,
        tags: row.get(7)?,
        likes: row.get(8)?,
        dislikes: row.get(9)?,
    })
}

pub fn find(conn: &Connection, id: i64) -> Result<Option<Article>> {
    let sql = format!("SELECT {} FROM article WHERE id = ?1", COLUMNS);
    Ok(conn.query_row(&sql, [id], row_to_article).optional()?)
}

pub struct ArticleFilter {
    pub search: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
}

/// 最新优先
pub fn list(conn: &Connection, filter: &ArticleFilter, page: PageQuery) -> Result<Paginated<Article>> {
    let mut conditions: Vec<String> = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        params.push(Box::new(format!("%{}%", search)));
        conditions.push(format!("(title LIKE ?{0} OR content LIKE ?{0})", params.len()));
    }
    if let Some(author) = filter.author.as_deref().filter(|s| !s.is_empty()) {
        params.push(Box::new(author.to_string()));
        conditions.push(format!("author = ?{}", params.len()));
    }
    if let Some(category) = filter.category.as_deref().filter(|s| !s.is_empty()) {
        params.push(Box::new(category.to_string()));
        conditions.push(format!("category = ?{}", params.len()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM article {}", where_clause),
        rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
        |row| row.get(0),
    )?;
    if total == 0 {
        return Ok(Paginated::empty());
    }

    params.push(Box::new(page.limit()));
    params.push(Box::new(page.offset()));
    let sql = format!(
        "SELECT {} FROM article {} ORDER BY created_at DESC, id DESC LIMIT ?{} OFFSET ?{}",
        COLUMNS,
        where_clause,
        params.len() - 1,
        params.len()
    );
    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(
            rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
            row_to_article,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Paginated {
        total: total as u64,
        items,
    })
}

/// 插入文章，返回带自增 id 的记录
pub fn insert(conn: &Connection, article: &Article) -> Result<Article> {
    conn.execute(
        "INSERT INTO article (created_at, updated_at, title, content, author, category, tags, likes, dislikes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, 0)",
        rusqlite::params![
            format_timestamp(&article.created_at),
            format_timestamp(&article.updated_at),
            article.title,
            article.content,
            article.author,
            article.category,
            article.tags,
        ],
    )?;
    Ok(Article {
        id: conn.last_insert_rowid(),
        likes: 0,
        dislikes: 0,
        ..article.clone()
    })
}

pub fn update(conn: &Connection, article: &Article) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE article SET title = ?2, content = ?3, category = ?4, tags = ?5, updated_at = ?6 WHERE id = ?1",
        rusqlite::params![
            article.id,
            article.title,
            article.content,
            article.category,
            article.tags,
            format_timestamp(&article.updated_at),
        ],
    )?;
    Ok(updated > 0)
}

pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
    Ok(conn.execute("DELETE FROM article WHERE id = ?1", [id])? > 0)
}

/// 原子更新计数，计数不小于 0；返回更新后的文章
pub fn react(conn: &Connection, id: i64, action: LikeAction) -> Result<Option<Article>> {
    let assignment = match action {
        LikeAction::Like => "likes = likes + 1",
        LikeAction::Unlike => "likes = MAX(likes - 1, 0)",
        LikeAction::Dislike => "dislikes = dislikes + 1",
        LikeAction::Undislike => "dislikes = MAX(dislikes - 1, 0)",
    };
    let updated = conn.execute(
        &format!("UPDATE article SET {} WHERE id = ?1", assignment),
        [id],
    )?;
    if updated == 0 {
        return Ok(None);
    }
    find(conn, id)
}
