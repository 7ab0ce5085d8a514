// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含服务器、Redis、缓存、抓取引擎、后台工作器和指标等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// Redis配置
    #[serde(default)]
    pub redis: RedisSettings,
    /// 缓存配置
    pub cache: CacheSettings,
    /// 抓取配置
    pub scraper: ScraperSettings,
    /// 后台工作器配置
    pub workers: WorkerSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// Redis配置设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedisSettings {
    /// Redis连接URL，未设置时缓存不可用
    pub url: Option<String>,
}

/// 缓存后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
    Disabled,
}

/// 缓存配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// 缓存后端 (redis, memory, disabled)
    pub backend: CacheBackend,
    /// 条目过期时间（秒）
    pub ttl_seconds: u64,
    /// 缓存键前缀
    pub namespace: String,
    /// 内存后端的最大条目数
    pub max_entries: usize,
}

/// 抓取配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperSettings {
    /// 商品站点根地址
    pub base_url: String,
    /// 每个搜索词返回的商品数
    pub num_results: usize,
    /// 普通 HTTP 请求超时（秒）
    pub http_timeout_secs: u64,
    /// 出站代理地址
    pub proxy: Option<String>,
    /// FlareSolverr 服务地址，未设置时禁用该引擎
    pub flaresolverr_url: Option<String>,
    /// Chrome 可执行文件路径，未设置时自动查找
    pub chrome_executable: Option<String>,
    /// 浏览器等待商品元素出现的最长时间（秒）
    pub browser_wait_secs: u64,
    /// HTTP 类引擎的硬超时（秒）
    pub http_strategy_timeout_secs: u64,
    /// 浏览器类引擎的硬超时（秒）
    pub browser_strategy_timeout_secs: u64,
    /// 是否启用无头浏览器引擎
    pub enable_browser: bool,
    /// 是否启用隐身浏览器引擎
    pub enable_stealth: bool,
}

/// 后台工作器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSettings {
    /// 工作器数量
    pub count: usize,
    /// 任务队列容量
    pub queue_capacity: usize,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启动 Prometheus 导出器
    pub enabled: bool,
    /// 导出器监听地址
    pub listen_addr: String,
}

/// 兼容旧部署的扁平环境变量
const LEGACY_REDIS_VARS: [&str; 4] = ["REDIS_HOST", "REDIS_PORT", "REDIS_DB", "REDIS_PASSWORD"];

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载默认值、`config/default`、`config/{APP_ENVIRONMENT}`、
    /// `OUTFITRS__` 前缀的环境变量以及兼容的扁平环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults(Config::builder())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("OUTFITRS").separator("__"));

        let builder = apply_legacy_env(builder, |key| std::env::var(key).ok())?;
        builder.build()?.try_deserialize()
    }

    /// 仅使用内置默认值构造配置，测试中使用
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::defaults(Config::builder())?.build()?.try_deserialize()
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            // Server
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            // Cache
            .set_default("cache.backend", "redis")?
            .set_default("cache.ttl_seconds", 3600)?
            .set_default("cache.namespace", "myntra")?
            .set_default("cache.max_entries", 10_000)?
            // Scraper
            .set_default("scraper.base_url", "https://www.myntra.com")?
            .set_default("scraper.num_results", 2)?
            .set_default("scraper.http_timeout_secs", 10)?
            .set_default("scraper.browser_wait_secs", 15)?
            .set_default("scraper.http_strategy_timeout_secs", 20)?
            .set_default("scraper.browser_strategy_timeout_secs", 60)?
            .set_default("scraper.enable_browser", true)?
            .set_default("scraper.enable_stealth", true)?
            // Workers
            .set_default("workers.count", 2)?
            .set_default("workers.queue_capacity", 32)?
            // Metrics
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }
}

/// 应用扁平环境变量覆盖
///
/// `REDIS_HOST` 等任一变量存在时，组装 `redis.url`；
/// `CACHE_TTL_SECONDS` 与 `SCRAPER_PROXY` 分别覆盖对应字段
pub(crate) fn apply_legacy_env<F>(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    lookup: F,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = builder;

    if LEGACY_REDIS_VARS.iter().any(|key| lookup(key).is_some()) {
        let host = lookup("REDIS_HOST").unwrap_or_else(|| "localhost".to_string());
        let port = lookup("REDIS_PORT").unwrap_or_else(|| "6379".to_string());
        let db = lookup("REDIS_DB").unwrap_or_else(|| "0".to_string());
        let url = match lookup("REDIS_PASSWORD").filter(|p| !p.is_empty()) {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                urlencoding::encode(&password),
                host,
                port,
                db
            ),
            None => format!("redis://{}:{}/{}", host, port, db),
        };
        builder = builder.set_override("redis.url", url)?;
    }

    if let Some(ttl) = lookup("CACHE_TTL_SECONDS") {
        let ttl: u64 = ttl.trim().parse().map_err(|_| {
            ConfigError::Message(format!("CACHE_TTL_SECONDS is not a number: {}", ttl))
        })?;
        builder = builder.set_override("cache.ttl_seconds", ttl)?;
    }

    if let Some(proxy) = lookup("SCRAPER_PROXY").filter(|p| !p.trim().is_empty()) {
        builder = builder.set_override("scraper.proxy", proxy)?;
    }

    Ok(builder)
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
