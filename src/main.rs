mod article;
mod auth;
mod comment;
mod common;
mod db;
mod error;
mod model;
mod oplog;
mod server;
mod timing;
mod user;

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use model::arg::Args;
use model::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 可选
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config_path = args
        .config
        .unwrap_or_else(|| Config::default_config_path().to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("加载配置失败: {}", config_path))?;
    if let Some(path) = config.config_path() {
        tracing::info!("配置文件: {}", path.display());
    }
    if config.secure_cookies() && config.auth.secret == Config::default().auth.secret {
        tracing::warn!("生产环境仍在使用默认 JWT 密钥，请设置 JWT_SECRET");
    }

    let db_path = config.sqlite_path()?.to_string();
    let db = db::Database::open(&db_path)
        .with_context(|| format!("打开数据库失败: {}", db_path))?;
    tracing::info!("数据库已就绪: {}", db_path);

    let addr = format!("{}:{}", config.host, config.port);
    let app_name = config.app_name.clone();
    let app_env = config.app_env;

    let state = server::AppState::new(config, db);
    let app = server::create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("监听地址失败: {}", addr))?;
    tracing::info!("{} 启动 ({:?})，监听 http://{}", app_name, app_env, addr);
    tracing::info!("API 端点:");
    tracing::info!("  /api/users");
    tracing::info!("  /api/articles");
    tracing::info!("  /api/comments");
    tracing::info!("  GET /api/system/oplogs");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
