// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::domain::models::product::Product;
use crate::engines::router::{EngineRouter, RouteOutcome};
use crate::infrastructure::cache::cache_manager::CacheHandle;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// 商品搜索服务
///
/// 单个搜索词的完整流程：查缓存 → 未命中时按顺序尝试引擎 → 有可用页面时写缓存
pub struct ProductSearchService {
    router: Arc<EngineRouter>,
    cache: CacheHandle,
    namespace: String,
    ttl: Duration,
    num_results: usize,
}

impl ProductSearchService {
    pub fn new(
        router: Arc<EngineRouter>,
        cache: CacheHandle,
        namespace: impl Into<String>,
        ttl: Duration,
        num_results: usize,
    ) -> Self {
        Self {
            router,
            cache,
            namespace: namespace.into(),
            ttl,
            num_results,
        }
    }

    /// 根据配置创建服务
    pub fn from_settings(settings: &Settings, router: Arc<EngineRouter>, cache: CacheHandle) -> Self {
        Self::new(
            router,
            cache,
            settings.cache.namespace.clone(),
            Duration::from_secs(settings.cache.ttl_seconds),
            settings.scraper.num_results,
        )
    }

    /// 搜索词对应的缓存键
    pub fn cache_key(&self, query: &str) -> String {
        format!("{}:{}", self.namespace, query)
    }

    /// 查找搜索词对应的商品
    ///
    /// # 参数
    ///
    /// * `query` - 搜索词
    ///
    /// # 返回值
    ///
    /// 商品列表，所有引擎都失败时为空；不会返回错误
    pub async fn find_products(&self, query: &str) -> Vec<Product> {
        let key = self.cache_key(query);

        if let Some(products) = self.cache.get(&key).await {
            counter!("product_cache_hits_total").increment(1);
            info!(query, count = products.len(), "Serving products from cache");
            return products;
        }
        counter!("product_cache_misses_total").increment(1);

        let outcome = self.router.route(query, self.num_results).await;
        let cacheable = outcome.is_cacheable();
        if let RouteOutcome::Found { engine, products } = &outcome {
            info!(query, engine = *engine, count = products.len(), "Products found");
        }

        let products = outcome.into_products();
        if cacheable {
            self.cache.set(&key, &products, self.ttl).await;
        } else {
            debug!(query, "No usable page from any engine, skipping cache write");
        }
        products
    }
}

#[cfg(test)]
#[path = "product_search_service_test.rs"]
mod tests;
