// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use metrics::{counter, gauge};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::infrastructure::cache::redis_client::RedisClient;

/// 内存缓存默认容量
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// 两次过期清理之间的最短间隔
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// 缓存条目
#[derive(Clone)]
struct CacheEntry {
    data: String,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn new(data: String, ttl: Duration) -> Self {
        Self {
            data,
            created_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }
}

/// 缓存策略接口
///
/// 值为序列化后的 JSON 文本，编解码由 [`CacheHandle`](crate::infrastructure::cache::cache_manager::CacheHandle) 负责
#[async_trait]
pub trait CacheStrategy: Send + Sync {
    /// 获取缓存值
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// 设置缓存值
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// 后端名称
    fn name(&self) -> &'static str;
}

/// 内存缓存策略
///
/// 写入时清理过期条目；超过容量时按写入时间淘汰最旧的条目
pub struct MemoryCacheStrategy {
    cache: DashMap<String, CacheEntry>,
    max_entries: usize,
    last_sweep: Mutex<Instant>,
}

impl Default for MemoryCacheStrategy {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }
}

impl MemoryCacheStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定最大条目数，0 按 1 处理
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            cache: DashMap::new(),
            max_entries: max_entries.max(1),
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// 当前条目数（包括尚未清理的过期条目）
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// 删除已过期的条目；期间被其他写入刷新的条目保留
    fn discard_if_expired(&self, key: &str) -> bool {
        self.cache
            .remove_if(key, |_, entry| entry.is_expired())
            .is_some()
    }

    fn sweep_due(&self) -> bool {
        match self.last_sweep.try_lock() {
            Ok(mut last) if last.elapsed() >= SWEEP_INTERVAL => {
                *last = Instant::now();
                true
            }
            _ => false,
        }
    }

    fn evict_if_needed(&self) {
        let over_capacity = self.cache.len() > self.max_entries;
        if !over_capacity && !self.sweep_due() {
            return;
        }

        let before = self.cache.len();
        self.cache.retain(|_, entry| !entry.is_expired());

        let current = self.cache.len();
        if current > self.max_entries {
            // Excess plus 10% of capacity
            let to_evict = current - self.max_entries + self.max_entries / 10;
            let mut entries: Vec<(String, Instant)> = self
                .cache
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().created_at))
                .collect();
            entries.sort_by_key(|(_, created_at)| *created_at);

            for (key, _) in entries.into_iter().take(to_evict) {
                self.cache.remove(&key);
            }
        }

        let evicted = before.saturating_sub(self.cache.len());
        if evicted > 0 {
            counter!("product_cache_evictions_total").increment(evicted as u64);
            debug!(evicted, remaining = self.cache.len(), "Evicted memory cache entries");
        }
        gauge!("product_cache_entries").set(self.cache.len() as f64);
    }
}

#[async_trait]
impl CacheStrategy for MemoryCacheStrategy {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let cached = self
            .cache
            .get(key)
            .map(|entry| (!entry.is_expired()).then(|| entry.data.clone()));

        match cached {
            Some(Some(data)) => Ok(Some(data)),
            Some(None) => {
                self.discard_if_expired(key);
                debug!(key, "Memory cache entry expired");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.cache.insert(key.to_string(), CacheEntry::new(value, ttl));
        self.evict_if_needed();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Redis缓存策略
pub struct RedisCacheStrategy {
    redis_client: Arc<RedisClient>,
}

impl RedisCacheStrategy {
    pub fn new(redis_client: Arc<RedisClient>) -> Self {
        Self { redis_client }
    }
}

#[async_trait]
impl CacheStrategy for RedisCacheStrategy {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.redis_client.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        // SETEX rejects a zero expiry
        let ttl_seconds = ttl.as_secs().max(1);
        self.redis_client.set(key, &value, ttl_seconds).await
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_memory_entry_expires_after_ttl() {
        let cache = MemoryCacheStrategy::new();
        cache
            .set("myntra:Blue Jeans for men", "[]".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            cache.get("myntra:Blue Jeans for men").await.unwrap().as_deref(),
            Some("[]")
        );

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get("myntra:Blue Jeans for men").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_are_swept_on_write() {
        let cache = MemoryCacheStrategy::new();
        for i in 0..500 {
            cache
                .set(&format!("myntra:query {}", i), "[]".to_string(), Duration::from_secs(1))
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), 500);

        tokio::time::advance(Duration::from_secs(3600)).await;
        cache
            .set("myntra:White T-shirt for men", "[]".to_string(), Duration::from_secs(3600))
            .await
            .unwrap();

        assert_eq!(cache.len(), 1);
        assert!(cache
            .get("myntra:White T-shirt for men")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_oldest_entries() {
        let cache = MemoryCacheStrategy::with_capacity(100);
        for i in 0..250 {
            cache
                .set(&format!("myntra:query {}", i), "[]".to_string(), Duration::from_secs(3600))
                .await
                .unwrap();
            tokio::time::advance(Duration::from_millis(1)).await;
        }

        assert!(cache.len() <= 100);
        assert!(cache.get("myntra:query 0").await.unwrap().is_none());
        assert!(cache.get("myntra:query 249").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_read_keeps_refreshed_entry() {
        let cache = MemoryCacheStrategy::new();
        cache
            .set("myntra:k", "old".to_string(), Duration::from_secs(1))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        // The key is rewritten between the expired read and its cleanup
        cache
            .set("myntra:k", "new".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        assert!(!cache.discard_if_expired("myntra:k"));
        assert_eq!(cache.get("myntra:k").await.unwrap().as_deref(), Some("new"));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.discard_if_expired("myntra:k"));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_redis_strategy_propagates_connection_errors() {
        let client = RedisClient::new("redis://127.0.0.1:1/0").await.unwrap();
        let cache = RedisCacheStrategy::new(Arc::new(client));

        assert!(cache.get("k").await.is_err());
        assert!(cache
            .set("k", "v".to_string(), Duration::from_secs(1))
            .await
            .is_err());
    }
}
