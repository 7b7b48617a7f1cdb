//! 认证中间件与提取器

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::error::AppError;
use crate::server::scope::CurrentUser;
use crate::server::state::AppState;
use crate::user::model::User;

/// 从请求中提取 JWT token
fn extract_token(jar: &CookieJar, request: &Request<Body>, cookie_name: &str) -> Option<String> {
    // 1. 优先从 Cookie 获取
    if let Some(cookie) = jar.get(cookie_name) {
        return Some(cookie.value().to_string());
    }

    // 2. 从 Authorization header 获取
    if let Some(auth_header) = request.headers().get("authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    None
}

/// 解析登录态；无效 token 按匿名请求处理
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(&jar, &request, &state.config.auth.cookie_name) {
        match state.jwt.verify_token(&token) {
            Ok(claims) => match state.users.find_by_email(&claims.sub).await {
                Ok(Some(user)) => {
                    request.extensions_mut().insert(CurrentUser(user));
                }
                Ok(None) => tracing::debug!("Token 对应的用户不存在: {}", claims.sub),
                Err(e) => tracing::error!("加载登录用户失败: {:#}", e),
            },
            Err(e) => tracing::debug!("Token 校验失败: {}", e),
        }
    }
    next.run(request).await
}

/// 要求已登录，否则返回 401
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .map(|current| AuthUser(current.0.clone()))
            .ok_or_else(AppError::unauthorized)
    }
}
