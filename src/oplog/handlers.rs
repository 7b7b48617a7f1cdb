//! 操作日志查询处理器

use axum::extract::{Query, State};
use axum::response::Json;

use crate::auth::AuthUser;
use crate::common::Paginated;
use crate::error::AppError;
use crate::server::response::{success, ApiResponse};
use crate::server::scope::RequestScope;
use crate::server::state::AppState;

use super::model::OpLog;
use super::types::OpLogListQuery;

/// GET /api/system/oplogs
pub async fn list_oplogs(
    State(state): State<AppState>,
    _user: AuthUser,
    scope: RequestScope,
    Query(query): Query<OpLogListQuery>,
) -> Result<Json<ApiResponse<Paginated<OpLog>>>, AppError> {
    let (object, page) = query.into_parts().map_err(AppError::BadRequest)?;
    let logs = scope.timed("db", state.oplogs.list(object, page)).await?;
    Ok(success(logs))
}
