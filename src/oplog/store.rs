//! 操作日志存储

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::common::format_timestamp;
use crate::db::{conversion_error, get_timestamp, Database};

use super::model::{ObjectInfo, OpLog, OpLogFilter, OpResult};

/// 操作日志记录存储（同步接口，由服务层放入阻塞线程池调用）
pub trait OpLogStore: Send + Sync + 'static {
    /// 在同一事务内“更新匹配记录，未命中则插入”，返回最终记录
    ///
    /// 实现必须保证整体原子：调用方被取消后，已开始的写入仍按一个整体完成
    fn upsert(&self, filter: &OpLogFilter, timestamp: &DateTime<Utc>, new_id: String)
        -> Result<OpLog>;

    fn count(&self, object: &ObjectInfo) -> Result<u64>;

    /// 按时间升序分页读取
    fn find_page(&self, object: &ObjectInfo, offset: i64, limit: i64) -> Result<Vec<OpLog>>;
}

const COLUMNS: &str =
    "id, object_type, object_id, operation, result, description, new_data, old_data, timestamp, user, ip, times";

// `IS` 同时覆盖等值和 NULL 比较
const MATCH_CLAUSE: &str = "object_type = ?1 AND object_id = ?2 AND operation = ?3 AND result = ?4
     AND description IS ?5 AND user IS ?6 AND ip IS ?7 AND new_data IS ?8 AND old_data IS ?9";

fn match_params(filter: &OpLogFilter) -> Vec<Box<dyn ToSql>> {
    vec![
        Box::new(filter.object_type.clone()),
        Box::new(filter.object_id.clone()),
        Box::new(filter.operation.clone()),
        Box::new(filter.result.as_str()),
        Box::new(filter.description.clone()),
        Box::new(filter.user.clone()),
        Box::new(filter.ip.clone()),
        Box::new(filter.new_data.clone()),
        Box::new(filter.old_data.clone()),
    ]
}

fn row_to_oplog(row: &Row<'_>) -> rusqlite::Result<OpLog> {
    let result: String = row.get(4)?;
    let result = OpResult::parse(&result)
        .ok_or_else(|| conversion_error(4, anyhow!("无效的操作结果: {}", result)))?;
    Ok(OpLog {
        id: row.get(0)?,
        object_type: row.get(1)?,
        object_id: row.get(2)?,
        operation: row.get(3)?,
        result,
        description: row.get(5)?,
        new_data: row.get(6)?,
        old_data: row.get(7)?,
        timestamp: get_timestamp(row, 8)?,
        user: row.get(9)?,
        ip: row.get(10)?,
        times: row.get(11)?,
    })
}

/// SQLite 实现
pub struct SqliteOpLogStore {
    db: Database,
}

impl SqliteOpLogStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// 查找一条描述字段完全匹配的记录
fn find_one_in(conn: &Connection, filter: &OpLogFilter) -> Result<Option<OpLog>> {
    let sql = format!("SELECT {} FROM op_log WHERE {} LIMIT 1", COLUMNS, MATCH_CLAUSE);
    let params = match_params(filter);
    let log = conn
        .query_row(
            &sql,
            rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
            row_to_oplog,
        )
        .optional()?;
    Ok(log)
}

/// 刷新匹配记录的时间并将次数加一，返回受影响行数
fn update_matching_in(
    conn: &Connection,
    filter: &OpLogFilter,
    timestamp: &DateTime<Utc>,
) -> Result<usize> {
    let sql = format!(
        "UPDATE op_log SET timestamp = ?10, times = times + 1 WHERE {}",
        MATCH_CLAUSE
    );
    let mut params = match_params(filter);
    params.push(Box::new(format_timestamp(timestamp)));
    let updated = conn.execute(
        &sql,
        rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
    )?;
    Ok(updated)
}

fn insert_in(conn: &Connection, log: &OpLog) -> Result<()> {
    conn.execute(
        "INSERT INTO op_log (id, object_type, object_id, operation, result, description, new_data, old_data, timestamp, user, ip, times)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        rusqlite::params![
            log.id,
            log.object_type,
            log.object_id,
            log.operation,
            log.result.as_str(),
            log.description,
            log.new_data,
            log.old_data,
            format_timestamp(&log.timestamp),
            log.user,
            log.ip,
            log.times,
        ],
    )?;
    Ok(())
}

impl OpLogStore for SqliteOpLogStore {
    fn upsert(
        &self,
        filter: &OpLogFilter,
        timestamp: &DateTime<Utc>,
        new_id: String,
    ) -> Result<OpLog> {
        // 连接锁 + 事务：更新与插入之间不会插入其他写入
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let log = if update_matching_in(&tx, filter, timestamp)? == 0 {
                let log = filter.to_record(new_id, *timestamp);
                insert_in(&tx, &log)?;
                log
            } else {
                find_one_in(&tx, filter)?.ok_or_else(|| anyhow!("操作日志更新后未找到记录"))?
            };
            tx.commit()?;
            Ok(log)
        })
    }

    fn count(&self, object: &ObjectInfo) -> Result<u64> {
        self.db.with_conn(|conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM op_log WHERE object_type = ?1 AND object_id = ?2",
                rusqlite::params![object.object_type, object.object_id],
                |row| row.get(0),
            )?;
            Ok(total as u64)
        })
    }

    fn find_page(&self, object: &ObjectInfo, offset: i64, limit: i64) -> Result<Vec<OpLog>> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM op_log WHERE object_type = ?1 AND object_id = ?2
                 ORDER BY timestamp ASC, rowid ASC LIMIT ?3 OFFSET ?4",
                COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let logs = stmt
                .query_map(
                    rusqlite::params![object.object_type, object.object_id, limit, offset],
                    row_to_oplog,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(logs)
        })
    }
}
