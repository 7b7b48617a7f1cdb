//! 用户接口

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::common::Paginated;
use crate::error::AppError;
use crate::server::response::{success, ApiResponse};
use crate::server::scope::RequestScope;
use crate::server::state::AppState;

use super::model::{
    ChangePasswordRequest, CreateUserRequest, LoginRequest, UpdateUserRequest, User,
    UserListQuery,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
    pub expires_in: u64,
}

/// POST /api/users/login
pub async fn login(
    State(state): State<AppState>,
    scope: RequestScope,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<LoginResponse>>), AppError> {
    let user = state.users.login(&scope, req).await?;
    let (token, expires_in) = state.jwt.generate_token(&user.email)?;

    let cookie = Cookie::build((state.config.auth.cookie_name.clone(), token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.secure_cookies())
        .max_age(time::Duration::seconds(expires_in as i64));

    Ok((
        jar.add(cookie),
        success(LoginResponse {
            user,
            token,
            expires_in,
        }),
    ))
}

/// POST /api/users/logout
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<()>>) {
    tracing::info!("用户登出: {}", user.email);
    let jar = jar.remove(Cookie::build(state.config.auth.cookie_name.clone()).path("/"));
    (jar, Json(ApiResponse::empty()))
}

/// GET /api/users/me
pub async fn me(AuthUser(user): AuthUser) -> Json<ApiResponse<User>> {
    success(user)
}

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    _user: AuthUser,
    scope: RequestScope,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<Paginated<User>>>, AppError> {
    Ok(success(state.users.list(&scope, query).await?))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    _user: AuthUser,
    scope: RequestScope,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    Ok(success(state.users.create(&scope, req).await?))
}

/// GET /api/users/{email}
pub async fn get_user(
    State(state): State<AppState>,
    _user: AuthUser,
    scope: RequestScope,
    Path(email): Path<String>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    Ok(success(state.users.get(&scope, &email).await?))
}

/// PATCH /api/users/{email}
pub async fn update_user(
    State(state): State<AppState>,
    _user: AuthUser,
    scope: RequestScope,
    Path(email): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    Ok(success(state.users.update(&scope, &email, req).await?))
}

/// PATCH /api/users/{email}/password
pub async fn change_password(
    State(state): State<AppState>,
    _user: AuthUser,
    scope: RequestScope,
    Path(email): Path<String>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.users.change_password(&scope, &email, req).await?;
    Ok(Json(ApiResponse::empty()))
}

/// DELETE /api/users/{email}
pub async fn delete_user(
    State(state): State<AppState>,
    _user: AuthUser,
    scope: RequestScope,
    Path(email): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.users.delete(&scope, &email).await?;
    Ok(Json(ApiResponse::empty()))
}
