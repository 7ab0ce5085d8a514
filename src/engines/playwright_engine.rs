// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScraperSettings;
use crate::engines::browser::{self, LaunchOptions, PageSetup};
use crate::engines::classifier::ResponseClassifier;
use crate::engines::reqwest_engine::DESKTOP_USER_AGENT;
use crate::engines::traits::{EngineError, FetchOutcome, ProductFetcher};
use crate::utils::url_utils::build_search_url;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::info;

/// Playwright引擎
///
/// 基于chromiumoxide实现的无头浏览器抓取引擎，每次抓取启动独立的浏览器实例
pub struct PlaywrightEngine {
    base_url: String,
    wait: Duration,
    hard_timeout: Duration,
    launch: LaunchOptions,
    classifier: ResponseClassifier,
}

impl PlaywrightEngine {
    /// 根据抓取配置创建引擎
    pub fn new(settings: &ScraperSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            wait: Duration::from_secs(settings.browser_wait_secs),
            hard_timeout: Duration::from_secs(settings.browser_strategy_timeout_secs),
            launch: LaunchOptions {
                chrome_executable: settings.chrome_executable.clone(),
                proxy: settings.proxy.clone(),
                window_size: Some((1366, 768)),
                extra_args: Vec::new(),
            },
            classifier: ResponseClassifier::for_browser(),
        }
    }

    pub fn launch_options(&self) -> &LaunchOptions {
        &self.launch
    }
}

#[async_trait]
impl ProductFetcher for PlaywrightEngine {
    /// 执行浏览器抓取
    ///
    /// # 参数
    ///
    /// * `query` - 搜索词
    /// * `num_results` - 最多返回的商品数
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchOutcome)` - 页面判定与提取结果
    /// * `Err(EngineError)` - 浏览器启动或页面操作失败
    async fn fetch(&self, query: &str, num_results: usize) -> Result<FetchOutcome, EngineError> {
        let url = build_search_url(&self.base_url, query);
        info!(engine = self.name(), %url, "Rendering search page in browser");

        let start = Instant::now();
        let setup = PageSetup {
            user_agent: Some(DESKTOP_USER_AGENT.to_string()),
            ..Default::default()
        };
        let page = browser::render_once(
            &self.launch,
            &url,
            self.wait,
            &setup,
            browser::render_budget(self.hard_timeout),
        )
        .await?;

        info!(
            engine = self.name(),
            bytes = page.body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Browser render finished"
        );
        Ok(FetchOutcome::from_page(&page, &self.classifier, num_results))
    }

    fn hard_timeout(&self) -> Duration {
        self.hard_timeout
    }

    fn name(&self) -> &'static str {
        "playwright"
    }
}

#[cfg(test)]
#[path = "playwright_engine_test.rs"]
mod tests;
