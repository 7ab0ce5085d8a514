// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScraperSettings;
use crate::engines::browser::{self, LaunchOptions, PageSetup};
use crate::engines::classifier::ResponseClassifier;
use crate::engines::traits::{EngineError, FetchOutcome, ProductFetcher};
use crate::utils::url_utils::build_search_url;
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::time::Duration;
use tracing::info;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36 Edg/122.0.0.0",
];

const VIEWPORTS: &[(u32, u32)] = &[(1920, 1080), (1536, 864), (1440, 900), (1366, 768)];

/// (locale, Accept-Language, navigator.languages)
const LOCALES: &[(&str, &str, &str)] = &[
    ("en-IN", "en-IN,en;q=0.9", "['en-IN', 'en']"),
    ("en-US", "en-US,en;q=0.9", "['en-US', 'en']"),
    ("en-GB", "en-GB,en;q=0.9", "['en-GB', 'en']"),
    ("hi-IN", "hi-IN,hi;q=0.9,en;q=0.8", "['hi-IN', 'hi', 'en']"),
];

const HARDWARE_CONCURRENCY: &[u8] = &[4, 8, 12, 16];
const DEVICE_MEMORY: &[u8] = &[4, 8];

const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined, configurable: true });
delete navigator.__proto__.webdriver;

Object.defineProperty(navigator, 'plugins', {
    get: () => {
        const plugins = [
            { name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer' },
            { name: 'Chrome PDF Viewer', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai' },
            { name: 'Native Client', filename: 'internal-nacl-plugin' }
        ];
        plugins.length = 3;
        return plugins;
    }
});

Object.defineProperty(navigator, 'languages', { get: () => __LANGUAGES__ });

window.chrome = window.chrome || { runtime: {}, loadTimes: function () {}, csi: function () {} };

if (window.navigator.permissions && window.navigator.permissions.query) {
    const originalQuery = window.navigator.permissions.query.bind(window.navigator.permissions);
    window.navigator.permissions.query = (parameters) => (
        parameters && parameters.name === 'notifications'
            ? Promise.resolve({ state: Notification.permission })
            : originalQuery(parameters)
    );
}

Object.defineProperty(navigator, 'hardwareConcurrency', { get: () => __HARDWARE_CONCURRENCY__ });
Object.defineProperty(navigator, 'deviceMemory', { get: () => __DEVICE_MEMORY__ });

const getParameter = WebGLRenderingContext.prototype.getParameter;
WebGLRenderingContext.prototype.getParameter = function (parameter) {
    if (parameter === 37445) return 'Intel Inc.';
    if (parameter === 37446) return 'Intel Iris OpenGL Engine';
    return getParameter.call(this, parameter);
};
"#;

/// 单次抓取的浏览器指纹
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StealthProfile {
    pub user_agent: &'static str,
    pub viewport: (u32, u32),
    pub locale: &'static str,
    pub accept_language: &'static str,
    pub languages: &'static str,
    pub hardware_concurrency: u8,
    pub device_memory: u8,
}

impl StealthProfile {
    /// 随机生成指纹
    pub fn random() -> Self {
        let mut rng = rand::rng();
        let (locale, accept_language, languages) =
            *LOCALES.choose(&mut rng).unwrap_or(&LOCALES[0]);

        Self {
            user_agent: USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0]),
            viewport: jitter(
                VIEWPORTS.choose(&mut rng).copied().unwrap_or(VIEWPORTS[0]),
                rng.random_range(0..24),
            ),
            locale,
            accept_language,
            languages,
            hardware_concurrency: HARDWARE_CONCURRENCY
                .choose(&mut rng)
                .copied()
                .unwrap_or(8),
            device_memory: DEVICE_MEMORY.choose(&mut rng).copied().unwrap_or(8),
        }
    }

    /// 注入页面的伪装脚本
    pub fn init_script(&self) -> String {
        STEALTH_SCRIPT
            .replace("__LANGUAGES__", self.languages)
            .replace("__HARDWARE_CONCURRENCY__", &self.hardware_concurrency.to_string())
            .replace("__DEVICE_MEMORY__", &self.device_memory.to_string())
    }

    /// 浏览器启动参数
    pub fn launch_options(&self, settings: &ScraperSettings) -> LaunchOptions {
        LaunchOptions {
            chrome_executable: settings.chrome_executable.clone(),
            proxy: settings.proxy.clone(),
            window_size: Some(self.viewport),
            extra_args: vec![
                "--disable-blink-features=AutomationControlled".to_string(),
                "--disable-features=IsolateOrigins,site-per-process".to_string(),
                "--disable-infobars".to_string(),
                format!("--lang={}", self.locale),
            ],
        }
    }

    /// 页面伪装设置
    pub fn page_setup(&self) -> PageSetup {
        PageSetup {
            user_agent: Some(self.user_agent.to_string()),
            accept_language: Some(self.accept_language.to_string()),
            viewport: Some(self.viewport),
            init_script: Some(self.init_script()),
        }
    }
}

fn jitter((width, height): (u32, u32), delta: u32) -> (u32, u32) {
    (width - delta, height - delta / 2)
}

/// 隐身浏览器引擎
///
/// 在无头浏览器基础上随机化指纹并隐藏自动化特征，成本最高，排在最后
pub struct StealthEngine {
    settings: ScraperSettings,
    wait: Duration,
    hard_timeout: Duration,
    classifier: ResponseClassifier,
}

impl StealthEngine {
    pub fn new(settings: &ScraperSettings) -> Self {
        Self {
            settings: settings.clone(),
            wait: Duration::from_secs(settings.browser_wait_secs),
            hard_timeout: Duration::from_secs(settings.browser_strategy_timeout_secs),
            classifier: ResponseClassifier::for_browser(),
        }
    }
}

#[async_trait]
impl ProductFetcher for StealthEngine {
    async fn fetch(&self, query: &str, num_results: usize) -> Result<FetchOutcome, EngineError> {
        let url = build_search_url(&self.settings.base_url, query);
        // ThreadRng is not Send; build the profile before the first await
        let profile = StealthProfile::random();
        info!(
            engine = self.name(),
            %url,
            locale = profile.locale,
            viewport = ?profile.viewport,
            "Rendering search page in stealth browser"
        );

        let page = browser::render_once(
            &profile.launch_options(&self.settings),
            &url,
            self.wait,
            &profile.page_setup(),
            browser::render_budget(self.hard_timeout),
        )
        .await?;

        Ok(FetchOutcome::from_page(&page, &self.classifier, num_results))
    }

    fn hard_timeout(&self) -> Duration {
        self.hard_timeout
    }

    fn name(&self) -> &'static str {
        "stealth"
    }
}
