// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScraperSettings;
use crate::domain::models::product::Product;
use crate::engines::fire_engine_tls::FireEngineTls;
use crate::engines::playwright_engine::PlaywrightEngine;
use crate::engines::reqwest_engine::ReqwestEngine;
use crate::engines::stealth_engine::StealthEngine;
use crate::engines::traits::{EngineError, FetchOutcome, ProductFetcher};
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// 路由结果
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// 某个引擎提取到了商品
    Found {
        engine: &'static str,
        products: Vec<Product>,
    },
    /// 至少一个引擎拿到了可用页面，但没有商品
    Settled,
    /// 所有引擎都失败、被拦截或页面无效
    Exhausted,
}

impl RouteOutcome {
    /// 结果是否可写入缓存
    ///
    /// 只有拿到过可用页面的结果才会缓存，传输错误和拦截页都视为暂时性失败
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, Self::Exhausted)
    }

    pub fn into_products(self) -> Vec<Product> {
        match self {
            Self::Found { products, .. } => products,
            Self::Settled | Self::Exhausted => Vec::new(),
        }
    }
}

/// 引擎路由器
///
/// 按成本从低到高依次尝试引擎，每个引擎在自身的硬超时内运行，
/// 第一个提取到商品的引擎即为结果
pub struct EngineRouter {
    /// 引擎列表
    engines: Vec<Arc<dyn ProductFetcher>>,
}

impl EngineRouter {
    /// 创建新的引擎路由器
    ///
    /// # 参数
    ///
    /// * `engines` - 引擎列表，顺序即尝试顺序
    pub fn new(engines: Vec<Arc<dyn ProductFetcher>>) -> Self {
        Self { engines }
    }

    /// 根据抓取配置组装默认引擎链
    ///
    /// 顺序为 reqwest → fire_engine_tls（配置了 FlareSolverr 时）→ playwright → stealth
    pub fn from_settings(settings: &ScraperSettings) -> Self {
        let mut engines: Vec<Arc<dyn ProductFetcher>> = vec![Arc::new(ReqwestEngine::new(settings))];

        if let Some(engine) = FireEngineTls::from_settings(settings) {
            engines.push(Arc::new(engine));
        }
        if settings.enable_browser {
            engines.push(Arc::new(PlaywrightEngine::new(settings)));
        }
        if settings.enable_stealth {
            engines.push(Arc::new(StealthEngine::new(settings)));
        }

        info!(
            engines = ?engines.iter().map(|e| e.name()).collect::<Vec<_>>(),
            "Engine chain assembled"
        );
        Self::new(engines)
    }

    /// 引擎名称，按尝试顺序
    pub fn engine_names(&self) -> Vec<&'static str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    /// 依次尝试引擎
    ///
    /// # 参数
    ///
    /// * `query` - 搜索词
    /// * `num_results` - 最多返回的商品数
    ///
    /// # 返回值
    ///
    /// 路由结果，引擎错误不会向上传播
    pub async fn route(&self, query: &str, num_results: usize) -> RouteOutcome {
        let start_time = Instant::now();
        let mut settled = false;

        for engine in &self.engines {
            let engine_name = engine.name();
            let engine_start = Instant::now();
            counter!("engine_attempts_total", "engine" => engine_name).increment(1);

            // A timeout drops the fetch future, which releases any browser it holds
            let result = tokio::time::timeout(engine.hard_timeout(), engine.fetch(query, num_results))
                .await
                .unwrap_or_else(|_| Err(EngineError::Timeout));

            histogram!("engine_duration_seconds", "engine" => engine_name)
                .record(engine_start.elapsed().as_secs_f64());

            match result {
                Ok(FetchOutcome::Extracted(products)) if !products.is_empty() => {
                    counter!("engine_hits_total", "engine" => engine_name).increment(1);
                    info!(
                        engine = engine_name,
                        query,
                        count = products.len(),
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Engine found products"
                    );
                    return RouteOutcome::Found {
                        engine: engine_name,
                        products,
                    };
                }
                Ok(FetchOutcome::Extracted(_)) => {
                    settled = true;
                    info!(engine = engine_name, query, "Usable page without products, trying next engine");
                }
                Ok(FetchOutcome::Rejected(verdict)) => {
                    counter!("engine_rejections_total", "engine" => engine_name, "verdict" => verdict.as_str())
                        .increment(1);
                    warn!(
                        engine = engine_name,
                        query,
                        verdict = verdict.as_str(),
                        "Page rejected, trying next engine"
                    );
                }
                Err(e) => {
                    counter!("engine_errors_total", "engine" => engine_name).increment(1);
                    warn!(engine = engine_name, query, "Engine failed: {}, trying next engine", e);
                }
            }
        }

        warn!(
            query,
            settled,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "No engine produced products"
        );
        if settled {
            RouteOutcome::Settled
        } else {
            RouteOutcome::Exhausted
        }
    }
}
