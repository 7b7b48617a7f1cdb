//! 操作日志查询参数

use serde::Deserialize;

use crate::common::PageQuery;

use super::model::ObjectInfo;

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

/// `GET /api/system/oplogs` 查询参数
#[derive(Debug, Deserialize)]
pub struct OpLogListQuery {
    pub object_type: String,
    pub object_id: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl OpLogListQuery {
    /// 拆分为查询对象和分页参数
    pub fn into_parts(self) -> Result<(ObjectInfo, PageQuery), String> {
        if self.object_type.trim().is_empty() || self.object_id.trim().is_empty() {
            return Err("object_type and object_id are required".to_string());
        }
        let page = PageQuery {
            page: self.page,
            page_size: self.page_size,
        };
        page.validate()?;
        Ok((ObjectInfo::new(self.object_type, self.object_id), page))
    }
}
