//! 评论接口

use axum::{
    extract::{Path, Query, State},
    response::Json,
};

use crate::auth::AuthUser;
use crate::common::Paginated;
use crate::error::AppError;
use crate::server::response::{success, ApiResponse};
use crate::server::scope::RequestScope;
use crate::server::state::AppState;

use super::model::{Comment, CommentListQuery, CreateCommentRequest, UpdateCommentRequest};

/// GET /api/comments
pub async fn list_comments(
    State(state): State<AppState>,
    scope: RequestScope,
    Query(query): Query<CommentListQuery>,
) -> Result<Json<ApiResponse<Paginated<Comment>>>, AppError> {
    Ok(success(state.comments.list(&scope, query).await?))
}

/// GET /api/comments/{id}
pub async fn get_comment(
    State(state): State<AppState>,
    scope: RequestScope,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Comment>>, AppError> {
    Ok(success(state.comments.get(&scope, id).await?))
}

/// POST /api/comments
pub async fn create_comment(
    State(state): State<AppState>,
    scope: RequestScope,
    Json(req): Json<CreateCommentRequest>,
) -> Result<Json<ApiResponse<Comment>>, AppError> {
    Ok(success(state.comments.create(&scope, req).await?))
}

/// PATCH /api/comments/{id}
pub async fn update_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    scope: RequestScope,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<Json<ApiResponse<Comment>>, AppError> {
    Ok(success(state.comments.update(&scope, &user, id, req).await?))
}

/// DELETE /api/comments/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    scope: RequestScope,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.comments.delete(&scope, &user, id).await?;
    Ok(Json(ApiResponse::empty()))
}
