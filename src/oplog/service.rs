//! 操作日志服务
//!
//! - 写入：描述字段完全相同的事件合并为一行并累加次数
//! - 查询：按对象分页，时间升序

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::common::{PageQuery, Paginated};

use super::error::OpLogError;
use super::model::{ObjectInfo, OpLog, OpLogData, OpLogFilter};
use super::store::OpLogStore;

/// 时钟
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 递归按 key 排序
fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k.clone(), sort_keys(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// 将前后数据序列化为规范 JSON
///
/// 空值返回 None；只接受对象结构，其余类型返回 `InvalidPayload`
pub fn canonical_json(value: Option<&Value>) -> Result<Option<String>, OpLogError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) if value.is_object() => serde_json::to_string(&sort_keys(value))
            .map(Some)
            .map_err(|e| OpLogError::InvalidPayload(e.to_string())),
        Some(_) => Err(OpLogError::InvalidPayload(
            "not a map or struct instance".to_string(),
        )),
    }
}

/// 操作日志服务
pub struct OpLogService {
    store: Arc<dyn OpLogStore>,
    clock: Arc<dyn Clock>,
}

impl OpLogService {
    pub fn new(store: Arc<dyn OpLogStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn OpLogStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn blocking<F, R>(&self, f: F) -> Result<R, OpLogError>
    where
        F: FnOnce(&dyn OpLogStore) -> anyhow::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await?
            .map_err(OpLogError::Storage)
    }

    /// 记录一次操作
    ///
    /// 已存在描述字段完全相同的记录时刷新时间并累加次数，否则插入新记录
    pub async fn create(&self, data: OpLogData) -> Result<OpLog, OpLogError> {
        let new_data = canonical_json(data.new_data.as_ref())?;
        let old_data = canonical_json(data.old_data.as_ref())?;

        let filter = OpLogFilter {
            object_type: data.object.object_type,
            object_id: data.object.object_id,
            operation: data.operation,
            result: data.result,
            description: data.description,
            user: data.user,
            ip: data.ip,
            new_data,
            old_data,
        };

        // 存储精度为毫秒
        let now = self.clock.now().trunc_subsecs(3);
        let new_id = Uuid::new_v4().to_string();

        // 更新与插入由存储在一个事务内完成，调用方中途取消不影响其原子性
        let log = self
            .blocking(move |store| store.upsert(&filter, &now, new_id))
            .await?;

        tracing::debug!(
            object_type = %log.object_type,
            object_id = %log.object_id,
            operation = %log.operation,
            times = log.times,
            "操作日志已记录"
        );
        Ok(log)
    }

    /// 分页查询某个对象的操作日志（时间升序）
    pub async fn list(
        &self,
        object: ObjectInfo,
        page: PageQuery,
    ) -> Result<Paginated<OpLog>, OpLogError> {
        self.blocking(move |store| {
            let total = store.count(&object)?;
            if total == 0 {
                return Ok(Paginated::empty());
            }
            let items = store.find_page(&object, page.offset(), page.limit())?;
            Ok(Paginated { total, items })
        })
        .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::Database;
    use crate::oplog::model::OpResult;
    use crate::oplog::store::SqliteOpLogStore;
    use chrono::TimeZone;
    use parking_lot::Mutex;
    use serde_json::json;

    /// 手动推进的时钟
    pub struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        pub fn at(time: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(time)))
        }

        pub fn set(&self, time: DateTime<Utc>) {
            *self.0.lock() = time;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock()
        }
    }

    fn t(seconds: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, seconds).unwrap()
    }

    fn service_at(time: DateTime<Utc>) -> (OpLogService, Arc<ManualClock>) {
        let db = Database::open_in_memory().unwrap();
        let clock = ManualClock::at(time);
        let service =
            OpLogService::with_clock(Arc::new(SqliteOpLogStore::new(db)), clock.clone());
        (service, clock)
    }

    fn event(object_id: &str, operation: &str) -> OpLogData {
        OpLogData {
            object: ObjectInfo::new("article", object_id),
            operation: operation.to_string(),
            description: None,
            result: OpResult::Success,
            user: Some("alice@example.com".to_string()),
            ip: Some("127.0.0.1".to_string()),
            new_data: Some(json!({"title": "Hello", "likes": 1})),
            old_data: None,
        }
    }

    async fn all(service: &OpLogService, object_id: &str) -> Paginated<OpLog> {
        service
            .list(
                ObjectInfo::new("article", object_id),
                PageQuery {
                    page: 1,
                    page_size: 100,
                },
            )
            .await
            .unwrap()
    }

    #[test]
    fn test_canonical_json_sorts_keys() {
        let a = canonical_json(Some(&json!({"b": 2, "a": {"d": 1, "c": [ {"z": 1, "y": 2} ]}})))
            .unwrap()
            .unwrap();
        assert_eq!(a, r#"{"a":{"c":[{"y":2,"z":1}],"d":1},"b":2}"#);
    }

    #[test]
    fn test_canonical_json_rejects_non_objects() {
        assert!(matches!(
            canonical_json(Some(&json!([1, 2]))),
            Err(OpLogError::InvalidPayload(_))
        ));
        assert!(matches!(
            canonical_json(Some(&json!("text"))),
            Err(OpLogError::InvalidPayload(_))
        ));
        assert_eq!(canonical_json(None).unwrap(), None);
        assert_eq!(canonical_json(Some(&Value::Null)).unwrap(), None);
    }

    #[tokio::test]
    async fn test_identical_events_collapse() {
        let (service, clock) = service_at(t(0));
        let first = service.create(event("1", "like")).await.unwrap();
        assert_eq!(first.times, 1);

        clock.set(t(30));
        let second = service.create(event("1", "like")).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.times, 2);
        assert_eq!(second.timestamp, t(30));

        let page = all(&service, "1").await;
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].times, 2);
        assert_eq!(page.items[0].timestamp, t(30));
    }

    #[tokio::test]
    async fn test_any_field_change_creates_new_row() {
        let (service, _) = service_at(t(0));
        service.create(event("1", "update")).await.unwrap();

        let mut changed_payload = event("1", "update");
        changed_payload.new_data = Some(json!({"title": "Hellp", "likes": 1}));
        service.create(changed_payload).await.unwrap();

        let mut anonymous = event("1", "update");
        anonymous.user = None;
        service.create(anonymous).await.unwrap();

        let mut failed = event("1", "update");
        failed.result = OpResult::Failure;
        service.create(failed).await.unwrap();

        let mut described = event("1", "update");
        described.description = Some("bulk edit".to_string());
        service.create(described).await.unwrap();

        let mut with_old = event("1", "update");
        with_old.old_data = Some(json!({"title": "Hello"}));
        service.create(with_old).await.unwrap();

        let page = all(&service, "1").await;
        assert_eq!(page.total, 6);
        assert!(page.items.iter().all(|log| log.times == 1));
    }

    #[tokio::test]
    async fn test_key_order_does_not_matter() {
        let (service, _) = service_at(t(0));
        let mut first = event("2", "update");
        first.new_data = Some(json!({"a": 1, "b": 2}));
        service.create(first).await.unwrap();

        let mut second = event("2", "update");
        second.new_data = Some(serde_json::from_str(r#"{"b":2,"a":1}"#).unwrap());
        let log = service.create(second).await.unwrap();

        assert_eq!(log.times, 2);
        assert_eq!(log.new_data.as_deref(), Some(r#"{"a":1,"b":2}"#));
        assert_eq!(all(&service, "2").await.total, 1);
    }

    #[tokio::test]
    async fn test_invalid_payload_is_not_stored() {
        let (service, _) = service_at(t(0));
        let mut bad = event("3", "create");
        bad.new_data = Some(json!([1, 2, 3]));

        let result = service.create(bad).await;
        assert!(matches!(result, Err(OpLogError::InvalidPayload(_))));
        assert_eq!(all(&service, "3").await.total, 0);
    }

    #[tokio::test]
    async fn test_concurrent_identical_events_share_one_row() {
        let (service, _) = service_at(t(0));
        let service = Arc::new(service);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.create(event("9", "like")).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let page = all(&service, "9").await;
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].times, 16);
    }

    /// 写入前先阻塞一段时间的存储
    struct SlowStore {
        inner: SqliteOpLogStore,
        delay: std::time::Duration,
    }

    impl OpLogStore for SlowStore {
        fn upsert(
            &self,
            filter: &OpLogFilter,
            timestamp: &DateTime<Utc>,
            new_id: String,
        ) -> anyhow::Result<OpLog> {
            std::thread::sleep(self.delay);
            self.inner.upsert(filter, timestamp, new_id)
        }

        fn count(&self, object: &ObjectInfo) -> anyhow::Result<u64> {
            self.inner.count(object)
        }

        fn find_page(
            &self,
            object: &ObjectInfo,
            offset: i64,
            limit: i64,
        ) -> anyhow::Result<Vec<OpLog>> {
            self.inner.find_page(object, offset, limit)
        }
    }

    #[tokio::test]
    async fn test_cancelled_create_does_not_duplicate() {
        let db = Database::open_in_memory().unwrap();
        let store = Arc::new(SlowStore {
            inner: SqliteOpLogStore::new(db),
            delay: std::time::Duration::from_millis(200),
        });
        let service = OpLogService::with_clock(store, ManualClock::at(t(0)));

        // 第一次写入在存储完成前被取消
        let cancelled = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            service.create(event("11", "dislike")),
        )
        .await;
        assert!(cancelled.is_err());

        service.create(event("11", "dislike")).await.unwrap();
        // 等待被取消的写入在阻塞线程中结束
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;

        let page = all(&service, "11").await;
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].times, 2);
    }

    #[tokio::test]
    async fn test_list_is_paginated_oldest_first() {
        let (service, clock) = service_at(t(0));
        for (second, op) in [(1, "create"), (2, "update"), (3, "like")] {
            clock.set(t(second));
            service.create(event("5", op)).await.unwrap();
        }
        // 其他对象不计入
        service.create(event("6", "create")).await.unwrap();

        let object = ObjectInfo::new("article", "5");
        let first = service
            .list(object.clone(), PageQuery { page: 1, page_size: 2 })
            .await
            .unwrap();
        assert_eq!(first.total, 3);
        let stamps: Vec<_> = first.items.iter().map(|log| log.timestamp).collect();
        assert_eq!(stamps, vec![t(1), t(2)]);

        let second = service
            .list(object, PageQuery { page: 2, page_size: 2 })
            .await
            .unwrap();
        assert_eq!(second.total, 3);
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].timestamp, t(3));
        assert_eq!(second.items[0].operation, "like");
    }

    #[tokio::test]
    async fn test_list_empty() {
        let (service, _) = service_at(t(0));
        let page = service
            .list(ObjectInfo::new("comment", "404"), PageQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
    }
}
