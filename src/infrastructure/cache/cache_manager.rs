// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::settings::{CacheBackend, Settings};
use crate::domain::models::product::Product;
use crate::infrastructure::cache::cache_strategy::{
    CacheStrategy, MemoryCacheStrategy, RedisCacheStrategy,
};
use crate::infrastructure::cache::redis_client::RedisClient;

/// 缓存句柄
///
/// 缓存不可用时为 `Disabled`：读取总是未命中，写入不做任何事。
/// 后端在运行期出错时同样降级，不会向调用方传播错误
#[derive(Clone)]
pub enum CacheHandle {
    Enabled(Arc<dyn CacheStrategy>),
    Disabled,
}

impl CacheHandle {
    /// 根据配置创建缓存句柄
    ///
    /// Redis 地址缺失、无效或无法 PING 通时降级为 `Disabled`
    pub async fn from_settings(settings: &Settings) -> Self {
        match settings.cache.backend {
            CacheBackend::Disabled => {
                info!("Cache disabled by configuration");
                Self::Disabled
            }
            CacheBackend::Memory => {
                info!(max_entries = settings.cache.max_entries, "Using in-memory cache");
                Self::Enabled(Arc::new(MemoryCacheStrategy::with_capacity(
                    settings.cache.max_entries,
                )))
            }
            CacheBackend::Redis => match settings.redis.url.as_deref() {
                Some(url) => Self::connect_redis(url).await,
                None => {
                    warn!("Redis cache selected but no redis.url configured, caching disabled");
                    Self::Disabled
                }
            },
        }
    }

    async fn connect_redis(url: &str) -> Self {
        let client = match RedisClient::new(url).await {
            Ok(client) => client,
            Err(e) => {
                warn!("Invalid Redis URL, caching disabled: {}", e);
                return Self::Disabled;
            }
        };

        match client.ping().await {
            Ok(()) => {
                info!("Redis cache connected");
                Self::Enabled(Arc::new(RedisCacheStrategy::new(Arc::new(client))))
            }
            Err(e) => {
                warn!("Redis unreachable, caching disabled: {}", e);
                Self::Disabled
            }
        }
    }

    /// 内存缓存句柄
    pub fn memory() -> Self {
        Self::Enabled(Arc::new(MemoryCacheStrategy::new()))
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    /// 读取商品列表
    ///
    /// # 返回值
    ///
    /// * `Some(products)` - 命中（可能是缓存的空列表）
    /// * `None` - 未命中、缓存不可用、后端出错或内容无法解析
    pub async fn get(&self, key: &str) -> Option<Vec<Product>> {
        let Self::Enabled(strategy) = self else {
            return None;
        };

        let raw = match strategy.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key, backend = strategy.name(), "Cache read failed: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<Vec<Product>>(&raw) {
            Ok(products) => {
                debug!(key, count = products.len(), "Cache hit");
                Some(products)
            }
            Err(e) => {
                warn!(key, "Discarding undecodable cache entry: {}", e);
                None
            }
        }
    }

    /// 写入商品列表，失败时只记录日志
    pub async fn set(&self, key: &str, products: &[Product], ttl: Duration) {
        let Self::Enabled(strategy) = self else {
            return;
        };

        let raw = match serde_json::to_string(products) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, "Failed to encode cache entry: {}", e);
                return;
            }
        };

        match strategy.set(key, raw, ttl).await {
            Ok(()) => debug!(key, count = products.len(), ttl_secs = ttl.as_secs(), "Cached products"),
            Err(e) => warn!(key, backend = strategy.name(), "Cache write failed: {}", e),
        }
    }
}
