//! 文章接口

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

use super::model::{
    Article, ArticleListQuery, CreateArticleRequest, LikeRequest, UpdateArticleRequest,
};

/// GET /api/articles
pub async fn list_articles(
    State(state): State<AppState>,
    scope: RequestScope,
    Query(query): Query<ArticleListQuery>,
) -> Result<Json<ApiResponse<Paginated<Article>>>, AppError> {
    Ok(success(state.articles.list(&scope, query).await?))
}

/// GET /api/articles/{id}
pub async fn get_article(
    State(state): State<AppState>,
    scope: RequestScope,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Article>>, AppError> {
    Ok(success(state.articles.get(&scope, id).await?))
}

/// POST /api/articles
pub async fn create_article(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    scope: RequestScope,
    Json(req): Json<CreateArticleRequest>,
) -> Result<Json<ApiResponse<Article>>, AppError> {
    Ok(success(state.articles.create(&scope, &user, req).await?))
}

/// PATCH /api/articles/{id}
pub async fn update_article(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    scope: RequestScope,
    Path(id): Path<i64>,
    Json(req): Json<UpdateArticleRequest>,
) -> Result<Json<ApiResponse<Article>>, AppError> {
    Ok(success(state.articles.update(&scope, &user, id, req).await?))
}

/// DELETE /api/articles/{id}
pub async fn delete_article(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    scope: RequestScope,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.articles.delete(&scope, &user, id).await?;
    Ok(Json(ApiResponse::empty()))
}

/// POST /api/articles/{id}/like
pub async fn like_article(
    State(state): State<AppState>,
    _user: AuthUser,
    scope: RequestScope,
    Path(id): Path<i64>,
    Json(req): Json<LikeRequest>,
) -> Result<Json<ApiResponse<Article>>, AppError> {
    Ok(success(state.articles.react(&scope, id, req.action).await?))
}
