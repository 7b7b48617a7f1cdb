//! SQLite 数据库句柄
//!
//! 单连接 + 互斥锁，所有阻塞操作通过 `spawn_blocking` 执行

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, Row};

use crate::common::parse_timestamp;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS user (
    email TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    password TEXT,
    birthdate TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS article (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    author TEXT NOT NULL,
    category TEXT,
    tags TEXT,
    likes INTEGER NOT NULL DEFAULT 0,
    dislikes INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_article_created ON article(created_at);
CREATE TABLE IF NOT EXISTS comment (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    biz_type TEXT NOT NULL,
    biz_id TEXT NOT NULL,
    content TEXT NOT NULL,
    author TEXT NOT NULL,
    parent_id INTEGER
);
CREATE INDEX IF NOT EXISTS idx_comment_biz ON comment(biz_type, biz_id, created_at);
CREATE TABLE IF NOT EXISTS op_log (
    id TEXT PRIMARY KEY,
    object_type TEXT NOT NULL,
    object_id TEXT NOT NULL,
    operation TEXT NOT NULL,
    result TEXT NOT NULL,
    description TEXT,
    new_data TEXT,
    old_data TEXT,
    timestamp TEXT NOT NULL,
    user TEXT,
    ip TEXT,
    times INTEGER NOT NULL DEFAULT 1
);
CREATE INDEX IF NOT EXISTS idx_op_log_object ON op_log(object_type, object_id, timestamp);
";

/// 共享数据库句柄
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// 打开数据库并初始化表结构
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// 内存数据库（测试用）
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 同步持有连接执行操作（会阻塞当前线程）
    pub fn with_conn<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// 在阻塞线程池中持有连接执行操作
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || db.with_conn(f)).await?
    }
}

/// 将列值解析错误包装为 rusqlite 转换错误
pub fn conversion_error(column: usize, e: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, e.into())
}

/// 读取 RFC3339 时间列
pub fn get_timestamp(row: &Row<'_>, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    let value: String = row.get(column)?;
    parse_timestamp(&value).map_err(|e| conversion_error(column, e))
}
