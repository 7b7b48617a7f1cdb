//! HTTP 服务：路由、中间件、请求上下文、响应结构

pub mod middleware;
pub mod response;
mod router;
pub mod scope;
pub mod state;

pub use router::create_app;
pub use state::AppState;
