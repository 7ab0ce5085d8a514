// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScraperSettings;
use crate::engines::classifier::ResponseClassifier;
use crate::engines::traits::{EngineError, FetchOutcome, ProductFetcher, RawPage};
use crate::utils::url_utils::build_search_url;
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// 桌面浏览器的 User-Agent
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// 构造桌面浏览器的请求头
pub fn desktop_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers.insert("sec-fetch-user", HeaderValue::from_static("?1"));
    headers
}

/// 抓取引擎
///
/// 基于reqwest实现的基本HTTP抓取引擎，成本最低，排在最前
pub struct ReqwestEngine {
    base_url: String,
    timeout: Duration,
    hard_timeout: Duration,
    proxy: Option<String>,
    classifier: ResponseClassifier,
}

impl ReqwestEngine {
    /// 根据抓取配置创建引擎
    pub fn new(settings: &ScraperSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            timeout: Duration::from_secs(settings.http_timeout_secs),
            hard_timeout: Duration::from_secs(settings.http_strategy_timeout_secs),
            proxy: settings.proxy.clone(),
            classifier: ResponseClassifier::for_http(),
        }
    }

    /// 替换站点根地址
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 替换单次请求超时
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 执行 GET 请求并返回原始页面
    ///
    /// # 参数
    ///
    /// * `url` - 目标地址
    ///
    /// # 返回值
    ///
    /// * `Ok(RawPage)` - 2xx 响应
    /// * `Err(EngineError)` - 网络错误、超时或非 2xx 状态码
    pub async fn get_page(&self, url: &str) -> Result<RawPage, EngineError> {
        // Each request gets a fresh client for cookie isolation
        let mut builder = reqwest::Client::builder()
            .user_agent(DESKTOP_USER_AGENT)
            .default_headers(desktop_headers())
            .timeout(self.timeout)
            .cookie_store(true);

        if let Some(proxy_url) = &self.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| EngineError::Other(format!("Invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        let start = Instant::now();
        let response = client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                EngineError::Timeout
            } else {
                EngineError::RequestFailed(e)
            }
        })?;

        let status = response.status();
        let final_url = response.url().to_string();
        if !status.is_success() {
            return Err(EngineError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        debug!(
            url = %final_url,
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched page over HTTP"
        );

        Ok(RawPage {
            status_code: status.as_u16(),
            final_url,
            body,
        })
    }
}

#[async_trait]
impl ProductFetcher for ReqwestEngine {
    /// 直接请求搜索结果页
    ///
    /// # 参数
    ///
    /// * `query` - 搜索词
    /// * `num_results` - 最多返回的商品数
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchOutcome)` - 页面判定与提取结果
    /// * `Err(EngineError)` - 传输层错误
    async fn fetch(&self, query: &str, num_results: usize) -> Result<FetchOutcome, EngineError> {
        let url = build_search_url(&self.base_url, query);
        info!(engine = self.name(), %url, "Fetching search page");

        let page = self.get_page(&url).await?;
        Ok(FetchOutcome::from_page(&page, &self.classifier, num_results))
    }

    fn hard_timeout(&self) -> Duration {
        self.hard_timeout
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
