//! 路由组装

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use super::middleware::{client_ip_middleware, timing_middleware};
use super::state::AppState;
use crate::auth::auth_middleware;
use crate::{article, comment, oplog, user};

/// CORS：仅允许前端地址，携带 Cookie
fn cors_layer(app_url: &str) -> Option<CorsLayer> {
    let origin = match HeaderValue::from_str(app_url.trim_end_matches('/')) {
        Ok(origin) => origin,
        Err(e) => {
            tracing::warn!("appUrl 无效，跳过 CORS 配置: {}", e);
            return None;
        }
    };
    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .expose_headers([super::middleware::SERVER_TIMING]),
    )
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// 创建应用路由
///
/// # 端点
/// - `/api/users` 用户与登录
/// - `/api/articles` 文章
/// - `/api/comments` 评论
/// - `/api/system/oplogs` 操作日志查询
/// - `GET /health`
///
/// 中间件顺序（外到内）：客户端 IP → 计时 → 认证
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .nest("/users", user::router())
        .nest("/articles", article::router())
        .nest("/comments", comment::router())
        .nest("/system/oplogs", oplog::router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn(timing_middleware))
        .layer(middleware::from_fn(client_ip_middleware));

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state.clone());

    match cors_layer(&state.config.app_url) {
        Some(cors) => app.layer(cors),
        None => app,
    }
}
