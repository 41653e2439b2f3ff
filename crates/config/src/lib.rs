//! shelf-config - 配置加载库
//!
//! 加载顺序: `default.toml` -> `{APP_ENV}.toml` -> `APP_` 前缀环境变量 (`__` 分隔层级)

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// 启动时执行 migrations
    #[serde(default)]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    // 开发环境: 10, 生产环境: 50
    match std::env::var("APP_ENV").as_deref() {
        Ok("production") => 50,
        _ => 10,
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// 会话 Cookie 配置
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_session_max_age")]
    pub max_age_secs: u64,
    /// 仅通过 HTTPS 发送
    #[serde(default)]
    pub secure: bool,
}

fn default_cookie_name() -> String {
    "username".to_string()
}

fn default_session_max_age() -> u64 {
    24 * 60 * 60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            max_age_secs: default_session_max_age(),
            secure: false,
        }
    }
}

/// 外部决策点 (PDP) 配置
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// PDP 地址, 用于 check
    pub pdp_url: String,
    /// 管理 API 地址, 用于 sync
    pub api_url: String,
    pub api_key: Secret<String>,
    #[serde(default = "default_scope")]
    pub project: String,
    #[serde(default = "default_scope")]
    pub environment: String,
    #[serde(default = "default_check_timeout_ms")]
    pub check_timeout_ms: u64,
    #[serde(default = "default_sync_timeout_ms")]
    pub sync_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_scope() -> String {
    "default".to_string()
}

fn default_check_timeout_ms() -> u64 {
    10_000
}

fn default_sync_timeout_ms() -> u64 {
    15_000
}

fn default_connect_timeout_ms() -> u64 {
    2_000
}

impl PolicyConfig {
    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_millis(self.sync_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// 授权守卫配置
#[derive(Debug, Clone, Deserialize)]
pub struct AuthzConfig {
    /// 受保护的资源类型
    #[serde(default = "default_resource")]
    pub resource: String,
    /// 资源所属租户
    #[serde(default = "default_scope")]
    pub tenant: String,
    #[serde(default = "default_role_lookup_timeout_ms")]
    pub role_lookup_timeout_ms: u64,
    #[serde(default = "default_check_timeout_ms")]
    pub decision_timeout_ms: u64,
    #[serde(default = "default_sync_timeout_ms")]
    pub sync_timeout_ms: u64,
}

fn default_resource() -> String {
    "books".to_string()
}

fn default_role_lookup_timeout_ms() -> u64 {
    5_000
}

impl AuthzConfig {
    pub fn role_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.role_lookup_timeout_ms)
    }

    pub fn decision_timeout(&self) -> Duration {
        Duration::from_millis(self.decision_timeout_ms)
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_millis(self.sync_timeout_ms)
    }
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            resource: default_resource(),
            tenant: default_scope(),
            role_lookup_timeout_ms: default_role_lookup_timeout_ms(),
            decision_timeout_ms: default_check_timeout_ms(),
            sync_timeout_ms: default_sync_timeout_ms(),
        }
    }
}

/// 角色缓存配置
///
/// 默认关闭; 开启时过期时间即为角色变更的最大可见延迟
#[derive(Debug, Clone, Deserialize)]
pub struct RoleCacheConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_role_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_role_cache_capacity")]
    pub max_capacity: u64,
    /// PostgreSQL NOTIFY 通道
    #[serde(default = "default_notify_channel")]
    pub notify_channel: String,
}

fn default_role_cache_ttl() -> u64 {
    30
}

fn default_role_cache_capacity() -> u64 {
    10_000
}

fn default_notify_channel() -> String {
    "role_changed".to_string()
}

impl Default for RoleCacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_secs: default_role_cache_ttl(),
            max_capacity: default_role_cache_capacity(),
            notify_channel: default_notify_channel(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    pub app_env: String,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub policy: PolicyConfig,
    #[serde(default)]
    pub authz: AuthzConfig,
    #[serde(default)]
    pub role_cache: RoleCacheConfig,
}

fn default_app_name() -> String {
    "catalog".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        // .env 不存在时忽略
        let _ = dotenvy::dotenv();
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        Self::figment(config_dir, &env).extract().map_err(ConfigError::from)
    }

    fn figment(config_dir: &str, env: &str) -> Figment {
        Figment::new()
            .merge(Serialized::default("app_env", env))
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("APP_").split("__").ignore(&["env"]))
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}
