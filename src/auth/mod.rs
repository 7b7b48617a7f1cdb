//! 登录认证：JWT、密码哈希、认证中间件

pub mod jwt;
mod middleware;
pub mod password;

pub use jwt::JwtManager;
pub use middleware::{auth_middleware, AuthUser};
