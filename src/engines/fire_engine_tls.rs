// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScraperSettings;
use crate::engines::classifier::ResponseClassifier;
use crate::engines::traits::{EngineError, FetchOutcome, ProductFetcher, RawPage};
use crate::utils::url_utils::build_search_url;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Fire Engine (TLS) 实现
///
/// 通过 FlareSolverr 转发请求，由其完成 JavaScript 挑战后返回页面，
/// 结果按普通 HTTP 页面的规则判定和提取
pub struct FireEngineTls {
    client: reqwest::Client,
    endpoint: String,
    base_url: String,
    max_timeout: Duration,
    hard_timeout: Duration,
    proxy: Option<String>,
    classifier: ResponseClassifier,
}

#[derive(Serialize)]
struct FlaresolverrRequest {
    cmd: String,
    url: String,
    #[serde(rename = "maxTimeout")]
    max_timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxy: Option<FlaresolverrProxy>,
}

#[derive(Serialize)]
struct FlaresolverrProxy {
    url: String,
}

#[derive(Deserialize, Debug)]
struct FlaresolverrResponse {
    status: String,
    #[serde(default)]
    message: String,
    solution: Option<FlaresolverrSolution>,
}

#[derive(Deserialize, Debug)]
struct FlaresolverrSolution {
    url: String,
    status: u16,
    response: String,
    #[serde(rename = "userAgent", default)]
    user_agent: Option<String>,
}

impl FireEngineTls {
    /// 根据抓取配置创建引擎
    ///
    /// 未配置 `flaresolverr_url` 时返回 `None`，该引擎不参与路由
    pub fn from_settings(settings: &ScraperSettings) -> Option<Self> {
        let endpoint = settings
            .flaresolverr_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())?;
        Some(Self::new(endpoint, settings))
    }

    /// 使用指定的 FlareSolverr 地址创建引擎
    pub fn new(endpoint: impl Into<String>, settings: &ScraperSettings) -> Self {
        let hard_timeout = Duration::from_secs(settings.http_strategy_timeout_secs);
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            base_url: settings.base_url.clone(),
            // Leave the relay some headroom inside the hard timeout
            max_timeout: hard_timeout.saturating_sub(Duration::from_secs(2)),
            hard_timeout,
            proxy: settings.proxy.clone(),
            classifier: ResponseClassifier::for_http(),
        }
    }

    async fn solve(&self, url: &str) -> Result<RawPage, EngineError> {
        let start = Instant::now();

        let req_body = FlaresolverrRequest {
            cmd: "request.get".to_string(),
            url: url.to_string(),
            max_timeout: self.max_timeout.as_millis() as u64,
            proxy: self.proxy.clone().map(|url| FlaresolverrProxy { url }),
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .timeout(self.hard_timeout)
            .json(&req_body)
            .send()
            .await
            .map_err(EngineError::RequestFailed)?;

        if !resp.status().is_success() && resp.status().as_u16() != 500 {
            return Err(EngineError::Solver(format!(
                "Flaresolverr responded with {}",
                resp.status()
            )));
        }

        let flare_resp: FlaresolverrResponse =
            resp.json().await.map_err(EngineError::RequestFailed)?;

        if flare_resp.status != "ok" {
            return Err(EngineError::Solver(format!(
                "Flaresolverr error: {}",
                flare_resp.message
            )));
        }

        let solution = flare_resp
            .solution
            .ok_or_else(|| EngineError::Solver("Flaresolverr returned no solution".to_string()))?;

        if !(200..300).contains(&solution.status) {
            return Err(EngineError::HttpStatus(solution.status));
        }

        debug!(
            url = %solution.url,
            status = solution.status,
            bytes = solution.response.len(),
            user_agent = solution.user_agent.as_deref().unwrap_or("-"),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Flaresolverr solved page"
        );

        Ok(RawPage {
            status_code: solution.status,
            final_url: solution.url,
            body: solution.response,
        })
    }
}

#[async_trait]
impl ProductFetcher for FireEngineTls {
    async fn fetch(&self, query: &str, num_results: usize) -> Result<FetchOutcome, EngineError> {
        let url = build_search_url(&self.base_url, query);
        info!(engine = self.name(), %url, "Relaying search page through Flaresolverr");

        let page = self.solve(&url).await?;
        Ok(FetchOutcome::from_page(&page, &self.classifier, num_results))
    }

    fn hard_timeout(&self) -> Duration {
        self.hard_timeout
    }

    fn name(&self) -> &'static str {
        "fire_engine_tls"
    }
}

#[cfg(test)]
#[path = "fire_engine_tls_test.rs"]
mod tests;
