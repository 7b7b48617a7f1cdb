//! 公共工具模块

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// 单页最大条数
pub const MAX_PAGE_SIZE: u32 = 100;

/// 分页查询参数
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PageQuery {
    /// 校验 page >= 1 且 1 <= page_size <= 100
    pub fn validate(&self) -> Result<(), String> {
        if self.page < 1 {
            return Err("page must be greater than or equal to 1".to_string());
        }
        if self.page_size < 1 || self.page_size > MAX_PAGE_SIZE {
            return Err(format!("page_size must be between 1 and {}", MAX_PAGE_SIZE));
        }
        Ok(())
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page_size) * (i64::from(self.page) - 1)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

/// 分页结果
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub total: u64,
    #[serde(rename = "list")]
    pub items: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn empty() -> Self {
        Self {
            total: 0,
            items: Vec::new(),
        }
    }
}

/// 统一的时间存储格式（RFC3339，毫秒精度，UTC）
///
/// 定长格式保证字符串序与时间序一致
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 解析数据库中的时间字符串
pub fn parse_timestamp(value: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_page_offset() {
        let query = PageQuery {
            page: 3,
            page_size: 20,
        };
        assert_eq!(query.offset(), 40);
        assert_eq!(query.limit(), 20);
    }

    #[test]
    fn test_page_validation() {
        assert!(PageQuery::default().validate().is_ok());
        assert!(PageQuery { page: 0, page_size: 10 }.validate().is_err());
        assert!(PageQuery { page: 1, page_size: 0 }.validate().is_err());
        assert!(PageQuery { page: 1, page_size: 101 }.validate().is_err());
        assert!(PageQuery { page: 1, page_size: 100 }.validate().is_ok());
    }

    #[test]
    fn test_paginated_serializes_list() {
        let page = Paginated {
            total: 1,
            items: vec!["a"],
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json, serde_json::json!({"total": 1, "list": ["a"]}));
    }

    #[test]
    fn test_timestamp_roundtrip_and_order() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let late = early + chrono::Duration::milliseconds(5);
        let a = format_timestamp(&early);
        let b = format_timestamp(&late);
        assert_eq!(a, "2024-01-01T09:00:00.000Z");
        assert!(a < b);
        assert_eq!(parse_timestamp(&b).unwrap(), late);
    }
}
