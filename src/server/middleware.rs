//! 通用中间件：客户端 IP、Server-Timing

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use super::scope::ClientIp;
use crate::timing::ServerTiming;

pub const SERVER_TIMING: HeaderName = HeaderName::from_static("server-timing");

/// 记录客户端 IP
pub async fn client_ip_middleware(mut request: Request<Body>, next: Next) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    if let Some(ip) = ip {
        request.extensions_mut().insert(ClientIp(ip));
    }
    next.run(request).await
}

/// 为请求挂载计时表，处理完成后写入 `Server-Timing` 响应头
pub async fn timing_middleware(mut request: Request<Body>, next: Next) -> Response {
    let timing = ServerTiming::begin();
    request.extensions_mut().insert(timing.clone());

    let mut response = next.run(request).await;

    if let Some(header) = timing.finalize() {
        match HeaderValue::from_str(&header) {
            Ok(value) => {
                response.headers_mut().insert(SERVER_TIMING, value);
            }
            Err(e) => tracing::debug!("Server-Timing 头无效，已忽略: {}", e),
        }
    }
    response
}
