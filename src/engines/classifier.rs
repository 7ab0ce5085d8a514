// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::RawPage;
use tracing::debug;

/// 拦截页特征词（小写匹配）
pub const BLOCK_MARKERS: &[&str] = &[
    "site maintenance",
    "access denied",
    "captcha",
    "something went wrong",
    "are you a human",
    "verify you are human",
    "just a moment",
];

/// 真实列表页必然包含的站点标识
pub const SITE_MARKER: &str = "myntra";

/// HTTP 类引擎的最小页面长度
pub const HTTP_MIN_LENGTH: usize = 1000;

/// 浏览器类引擎的最小页面长度
pub const BROWSER_MIN_LENGTH: usize = 2000;

/// 页面判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// 反爬拦截页
    Blocked,
    /// 过短或缺少站点标识，不是真实列表页
    TooShort,
    /// 可用于提取
    Usable,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Blocked => "blocked",
            Verdict::TooShort => "too_short",
            Verdict::Usable => "usable",
        }
    }
}

/// 响应判定器
#[derive(Debug, Clone)]
pub struct ResponseClassifier {
    min_length: usize,
    site_marker: String,
}

impl ResponseClassifier {
    pub fn new(min_length: usize, site_marker: impl Into<String>) -> Self {
        Self {
            min_length,
            site_marker: site_marker.into().to_lowercase(),
        }
    }

    /// HTTP 类引擎使用的判定器
    pub fn for_http() -> Self {
        Self::new(HTTP_MIN_LENGTH, SITE_MARKER)
    }

    /// 浏览器类引擎使用的判定器
    pub fn for_browser() -> Self {
        Self::new(BROWSER_MIN_LENGTH, SITE_MARKER)
    }

    /// 判定页面
    ///
    /// 拦截特征优先于长度检查，拦截页往往也很短
    pub fn classify(&self, page: &RawPage) -> Verdict {
        let lower = page.body.to_lowercase();

        if let Some(marker) = BLOCK_MARKERS.iter().find(|m| lower.contains(*m)) {
            debug!(
                url = %page.final_url,
                status = page.status_code,
                marker,
                "Response looks like an anti-bot page"
            );
            return Verdict::Blocked;
        }

        if page.body.len() < self.min_length || !lower.contains(&self.site_marker) {
            debug!(
                url = %page.final_url,
                status = page.status_code,
                length = page.body.len(),
                min_length = self.min_length,
                "Response is not a listing page"
            );
            return Verdict::TooShort;
        }

        Verdict::Usable
    }
}
