use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 运行环境
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    #[default]
    Dev,
    Test,
    Prod,
}

impl AppEnv {
    /// 解析 `APP_ENV` 取值，未知值回退到 dev
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "test" => Self::Test,
            _ => Self::Dev,
        }
    }
}

/// 登录态配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    /// 认证 Cookie 名称
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// 登录有效期（秒）
    #[serde(default = "default_auth_duration_secs")]
    pub duration_secs: u64,
    /// JWT 签名密钥
    #[serde(default = "default_auth_secret")]
    pub secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            duration_secs: default_auth_duration_secs(),
            secret: default_auth_secret(),
        }
    }
}

fn default_cookie_name() -> String {
    "auth_token".to_string()
}

fn default_auth_duration_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_auth_secret() -> String {
    "bilingo-secret-key-change-in-production".to_string()
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// 前端地址（用于 CORS）
    #[serde(default = "default_app_url")]
    pub app_url: String,

    /// 数据库地址，支持 `sqlite://path`、`file:path`、裸路径和 `:memory:`
    #[serde(default = "default_db_url")]
    pub db_url: String,

    #[serde(default)]
    pub app_env: AppEnv,

    #[serde(default)]
    pub auth: AuthConfig,

    /// 配置文件路径（运行时元数据，不写入 JSON）
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_app_name() -> String {
    "Bilingo".to_string()
}

fn default_app_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_db_url() -> String {
    "sqlite://bilingo.db".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            app_name: default_app_name(),
            app_url: default_app_url(),
            db_url: default_db_url(),
            app_env: AppEnv::default(),
            auth: AuthConfig::default(),
            config_path: None,
        }
    }
}

impl Config {
    /// 获取默认配置文件路径
    pub fn default_config_path() -> &'static str {
        "config.json"
    }

    /// 从文件加载配置，再应用环境变量覆盖
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
            serde_json::from_str::<Config>(&content)
                .with_context(|| format!("解析配置文件失败: {}", path.display()))?
        } else {
            // 配置文件不存在，使用默认配置
            Self::default()
        };
        config.config_path = Some(path.to_path_buf());
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// 应用环境变量覆盖（`APP_ENV`、`DATABASE_URL`、`JWT_SECRET`、`SERVER_PORT`）
    fn apply_env<F>(&mut self, var: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env) = var("APP_ENV").filter(|v| !v.is_empty()) {
            self.app_env = AppEnv::parse(&env);
        }
        if let Some(url) = var("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.db_url = url;
        }
        if let Some(secret) = var("JWT_SECRET").filter(|v| !v.is_empty()) {
            self.auth.secret = secret;
        }
        if let Some(port) = var("SERVER_PORT").filter(|v| !v.is_empty()) {
            self.port = port
                .parse()
                .with_context(|| format!("无效的 SERVER_PORT: {}", port))?;
        }
        Ok(())
    }

    /// 获取配置文件路径（如果有）
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// 解析数据库文件路径
    pub fn sqlite_path(&self) -> anyhow::Result<&str> {
        let url = self.db_url.trim();
        if url.is_empty() {
            anyhow::bail!("数据库地址未配置");
        }
        if let Some(path) = url.strip_prefix("sqlite://") {
            return Ok(path);
        }
        if let Some(path) = url.strip_prefix("file:") {
            return Ok(path);
        }
        if url.contains("://") {
            anyhow::bail!("不支持的数据库地址: {}", url);
        }
        Ok(url)
    }

    /// 生产环境下 Cookie 需要 Secure 标记
    pub fn secure_cookies(&self) -> bool {
        self.app_env == AppEnv::Prod
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.port, 8090);
        assert_eq!(config.auth.cookie_name, "auth_token");
        assert_eq!(config.auth.duration_secs, 7 * 24 * 60 * 60);
        assert_eq!(config.app_env, AppEnv::Dev);
    }

    #[test]
    fn test_camel_case_fields() {
        let config: Config = serde_json::from_str(
            r#"{"appName":"Demo","dbUrl":"file:demo.db","appEnv":"prod","auth":{"cookieName":"sid"}}"#,
        )
        .unwrap();
        assert_eq!(config.app_name, "Demo");
        assert_eq!(config.sqlite_path().unwrap(), "demo.db");
        assert!(config.secure_cookies());
        assert_eq!(config.auth.cookie_name, "sid");
        assert_eq!(config.auth.secret, default_auth_secret());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("APP_ENV", "production"),
            ("DATABASE_URL", "sqlite://other.db"),
            ("JWT_SECRET", "s3cret"),
            ("SERVER_PORT", "9000"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.app_env, AppEnv::Prod);
        assert_eq!(config.sqlite_path().unwrap(), "other.db");
        assert_eq!(config.auth.secret, "s3cret");
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = Config::default();
        let result = config.apply_env(|key| (key == "SERVER_PORT").then(|| "abc".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_unsupported_db_url() {
        let config = Config {
            db_url: "mysql://root@localhost/db".to_string(),
            ..Config::default()
        };
        assert!(config.sqlite_path().is_err());

        let memory = Config {
            db_url: ":memory:".to_string(),
            ..Config::default()
        };
        assert_eq!(memory.sqlite_path().unwrap(), ":memory:");
    }
}
