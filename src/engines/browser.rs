// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::extractor::CONTAINER_SELECTORS;
use crate::engines::traits::{EngineError, RawPage};
use crate::utils::port_sniffer::PortSniffer;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 商品元素出现后再等待的时间，让懒加载图片填充
const SETTLE_DELAY: Duration = Duration::from_millis(1500);

/// 轮询商品元素的间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 关闭浏览器时等待进程退出的上限
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// 为有序关闭预留的时间，渲染预算 = 引擎硬超时 - 该值
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// 引擎硬超时内留给启动和渲染的时间
///
/// 预留 [`SHUTDOWN_GRACE`] 使超时路径也能完成 [`BrowserSession::shutdown`]；
/// 硬超时不足两倍预留时间时按一半分配
pub fn render_budget(hard_timeout: Duration) -> Duration {
    if hard_timeout > SHUTDOWN_GRACE * 2 {
        hard_timeout - SHUTDOWN_GRACE
    } else {
        hard_timeout / 2
    }
}

/// 浏览器启动参数
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Chrome 可执行文件路径
    pub chrome_executable: Option<String>,
    /// 出站代理
    pub proxy: Option<String>,
    /// 窗口大小
    pub window_size: Option<(u32, u32)>,
    /// 额外的命令行参数
    pub extra_args: Vec<String>,
}

/// 单个页面的伪装设置
#[derive(Debug, Clone, Default)]
pub struct PageSetup {
    pub user_agent: Option<String>,
    pub accept_language: Option<String>,
    pub viewport: Option<(u32, u32)>,
    /// 在每个新文档加载前执行的脚本
    pub init_script: Option<String>,
}

/// 浏览器配置目录租约
///
/// 每次启动独占一个临时目录和一个调试端口，租约释放时删除目录
#[derive(Debug)]
pub struct ProfileLease {
    dir: TempDir,
    port: u16,
}

impl ProfileLease {
    /// 申请新的配置目录和调试端口
    pub fn acquire() -> Result<Self, EngineError> {
        let dir = tempfile::Builder::new()
            .prefix("outfitrs-profile-")
            .tempdir()
            .map_err(|e| EngineError::BrowserLaunch(format!("Failed to create profile dir: {}", e)))?;
        let port = PortSniffer::pick_debugging_port()
            .map_err(|e| EngineError::BrowserLaunch(e.to_string()))?;
        Ok(Self { dir, port })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// 删除配置目录并报告错误
    pub fn release(self) -> std::io::Result<()> {
        self.dir.close()
    }
}

/// 一次性浏览器会话
///
/// 持有浏览器进程、事件处理任务和配置目录。[`render_once`] 在成功、失败和渲染超时时
/// 都调用 [`BrowserSession::shutdown`]；future 被外层直接丢弃时由 `Drop` 兜底：
/// 终止事件任务、结束浏览器进程并删除配置目录
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    profile: Option<ProfileLease>,
}

impl BrowserSession {
    /// 启动独立的无头浏览器
    ///
    /// # 参数
    ///
    /// * `options` - 启动参数
    ///
    /// # 返回值
    ///
    /// * `Ok(BrowserSession)` - 已启动的会话
    /// * `Err(EngineError::BrowserLaunch)` - 目录、端口或进程启动失败
    pub async fn launch(options: &LaunchOptions) -> Result<Self, EngineError> {
        let profile = ProfileLease::acquire()?;

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(profile.path())
            .port(profile.port())
            .request_timeout(Duration::from_secs(30))
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        if let Some(executable) = &options.chrome_executable {
            builder = builder.chrome_executable(executable);
        }
        if let Some(proxy) = &options.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }
        if let Some((width, height)) = options.window_size {
            builder = builder.window_size(width, height);
        }
        for arg in &options.extra_args {
            builder = builder.arg(arg.as_str());
        }

        let config = builder.build().map_err(EngineError::BrowserLaunch)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| EngineError::BrowserLaunch(e.to_string()))?;

        // Spawn a handler to process browser events
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        info!(
            port = profile.port(),
            profile = %profile.path().display(),
            "Launched browser"
        );

        Ok(Self {
            browser,
            handler,
            profile: Some(profile),
        })
    }

    /// 打开页面，等待商品元素后读取 DOM
    ///
    /// # 参数
    ///
    /// * `url` - 目标地址
    /// * `wait` - 等待商品元素的最长时间，超时后仍读取当前 DOM
    /// * `setup` - 页面伪装设置
    pub async fn render(
        &self,
        url: &str,
        wait: Duration,
        setup: &PageSetup,
    ) -> Result<RawPage, EngineError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;

        let result = navigate(&page, url, wait, setup).await;

        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }
        result
    }

    /// 关闭浏览器，等待进程退出后删除配置目录
    pub async fn shutdown(mut self) {
        let browser = &mut self.browser;
        let closed = tokio::time::timeout(CLOSE_TIMEOUT, async move {
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser: {}", e);
            }
            if let Err(e) = browser.wait().await {
                warn!("Failed to wait for browser exit: {}", e);
            }
        })
        .await;
        if closed.is_err() {
            warn!("Browser did not exit within {:?}", CLOSE_TIMEOUT);
        }
        self.handler.abort();

        if let Some(profile) = self.profile.take() {
            let path = profile.path().to_path_buf();
            if let Err(e) = profile.release() {
                warn!(profile = %path.display(), "Failed to remove browser profile: {}", e);
            }
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // The browser process is spawned with kill_on_drop; the profile dir goes with `profile`
        self.handler.abort();
    }
}

async fn navigate(
    page: &Page,
    url: &str,
    wait: Duration,
    setup: &PageSetup,
) -> Result<RawPage, EngineError> {
    apply_setup(page, setup).await?;

    page.goto(url)
        .await
        .map_err(|e| EngineError::Browser(format!("Navigation failed: {}", e)))?;

    if !wait_for_products(page, wait).await {
        debug!(%url, "Product selector did not appear, reading DOM anyway");
    }
    tokio::time::sleep(SETTLE_DELAY).await;

    let body = page
        .content()
        .await
        .map_err(|e| EngineError::Browser(e.to_string()))?;
    let final_url = page
        .url()
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| url.to_string());

    Ok(RawPage {
        // The DOM has no status line; a rendered document counts as 200
        status_code: 200,
        final_url,
        body,
    })
}

async fn apply_setup(page: &Page, setup: &PageSetup) -> Result<(), EngineError> {
    let cdp = |e: chromiumoxide::error::CdpError| EngineError::Browser(e.to_string());

    if let Some(user_agent) = &setup.user_agent {
        let mut params = SetUserAgentOverrideParams::builder().user_agent(user_agent.as_str());
        if let Some(lang) = &setup.accept_language {
            params = params.accept_language(lang.as_str());
        }
        let params = params.build().map_err(EngineError::Browser)?;
        page.execute(params).await.map_err(cdp)?;
    }

    if let Some(lang) = &setup.accept_language {
        let headers = Headers::new(serde_json::json!({ "Accept-Language": lang }));
        page.execute(SetExtraHttpHeadersParams::new(headers))
            .await
            .map_err(cdp)?;
    }

    if let Some((width, height)) = setup.viewport {
        page.execute(SetDeviceMetricsOverrideParams::new(
            width as i64,
            height as i64,
            1.0,
            false,
        ))
        .await
        .map_err(cdp)?;
    }

    if let Some(script) = &setup.init_script {
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(script.as_str()))
            .await
            .map_err(cdp)?;
    }

    Ok(())
}

/// 轮询商品卡片选择器，出现返回 true，超过 `wait` 返回 false
async fn wait_for_products(page: &Page, wait: Duration) -> bool {
    let selector = CONTAINER_SELECTORS.join(", ");
    let deadline = tokio::time::Instant::now() + wait;

    loop {
        if page.find_element(selector.as_str()).await.is_ok() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// 启动浏览器、渲染一次页面并关闭
///
/// 渲染失败时同样执行关闭流程
/// 启动一次性浏览器渲染页面，并在所有路径上有序关闭
///
/// # 参数
///
/// * `budget` - 启动和渲染的总时长上限，超出时返回 `EngineError::Timeout`，浏览器仍会正常关闭
pub async fn render_once(
    options: &LaunchOptions,
    url: &str,
    wait: Duration,
    setup: &PageSetup,
    budget: Duration,
) -> Result<RawPage, EngineError> {
    let deadline = tokio::time::Instant::now() + budget;

    let session = tokio::time::timeout_at(deadline, BrowserSession::launch(options))
        .await
        .map_err(|_| EngineError::Timeout)??;

    let result = match tokio::time::timeout_at(deadline, session.render(url, wait, setup)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(%url, ?budget, "Render exceeded its budget, closing browser");
            Err(EngineError::Timeout)
        }
    };

    session.shutdown().await;
    result
}
