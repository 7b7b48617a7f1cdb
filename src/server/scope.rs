//! 请求上下文
//!
//! 中间件写入请求扩展，处理函数通过 `RequestScope` 提取

use std::convert::Infallible;
use std::future::Future;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::timing::ServerTiming;
use crate::user::model::User;

/// 客户端 IP（由 `client_ip_middleware` 写入）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

/// 已认证用户（由认证中间件写入，不含密码）
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// 单个请求的上下文：操作人、客户端 IP、计时器
#[derive(Debug, Clone, Default)]
pub struct RequestScope {
    pub user: Option<User>,
    pub client_ip: Option<String>,
    pub timing: Option<ServerTiming>,
}

impl RequestScope {
    /// 操作人邮箱
    pub fn user_email(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.email.as_str())
    }

    /// 开始计时；没有计时器时忽略
    pub fn start_timer(&self, name: &str, description: Option<&str>) {
        if let Some(timing) = &self.timing {
            timing.start(name, description);
        }
    }

    /// 结束计时；没有计时器时忽略
    pub fn stop_timer(&self, name: &str) {
        if let Some(timing) = &self.timing {
            timing.stop(name);
        }
    }

    /// 以 `name` 计时执行一个 future
    pub async fn timed<F: Future>(&self, name: &str, fut: F) -> F::Output {
        self.start_timer(name, None);
        let output = fut.await;
        self.stop_timer(name);
        output
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestScope {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            user: parts
                .extensions
                .get::<CurrentUser>()
                .map(|current| current.0.clone()),
            client_ip: parts.extensions.get::<ClientIp>().map(|ip| ip.0.clone()),
            timing: parts.extensions.get::<ServerTiming>().cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn test_timers_are_noop_without_timing() {
        let scope = RequestScope::default();
        scope.start_timer("db", None);
        scope.stop_timer("db");
        assert_eq!(scope.timed("db", async { 7 }).await, 7);
        assert!(scope.user_email().is_none());
    }

    #[tokio::test]
    async fn test_extracts_from_extensions() {
        let mut request = Request::builder().uri("/").body(()).unwrap();
        let timing = ServerTiming::begin();
        request.extensions_mut().insert(ClientIp("10.1.2.3".into()));
        request.extensions_mut().insert(timing.clone());
        let (mut parts, _) = request.into_parts();

        let scope = RequestScope::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(scope.client_ip.as_deref(), Some("10.1.2.3"));
        assert!(scope.user.is_none());

        scope.timed("db", async {}).await;
        let header = timing.finalize().unwrap();
        assert!(header.starts_with("db;dur="));
    }
}
