// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::product::Product;
use crate::engines::classifier::{ResponseClassifier, Verdict};
use crate::engines::extractor;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 引擎错误类型
///
/// 均视为传输层失败：路由器记录后继续尝试下一个引擎，不会写缓存
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 非 2xx 状态码
    #[error("Unexpected HTTP status: {0}")]
    HttpStatus(u16),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 浏览器启动失败
    #[error("Browser launch failed: {0}")]
    BrowserLaunch(String),
    /// 浏览器操作失败
    #[error("Browser error: {0}")]
    Browser(String),
    /// 反爬代理服务返回错误
    #[error("Challenge solver error: {0}")]
    Solver(String),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// 抓取到的原始页面
#[derive(Debug, Clone)]
pub struct RawPage {
    /// HTTP状态码
    pub status_code: u16,
    /// 最终地址（跟随跳转之后）
    pub final_url: String,
    /// 页面内容
    pub body: String,
}

/// 单个引擎的结算结果
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// 页面可用，包含提取出的商品（可能为空）
    Extracted(Vec<Product>),
    /// 页面被判定为拦截页或无效页
    Rejected(Verdict),
}

impl FetchOutcome {
    /// 对页面进行判定并在可用时提取商品
    pub fn from_page(page: &RawPage, classifier: &ResponseClassifier, num_results: usize) -> Self {
        match classifier.classify(page) {
            Verdict::Usable => Self::Extracted(extractor::extract_products(&page.body, num_results)),
            verdict => Self::Rejected(verdict),
        }
    }

    /// 提取到的商品，拒绝或为空时返回空切片
    pub fn products(&self) -> &[Product] {
        match self {
            Self::Extracted(products) => products,
            Self::Rejected(_) => &[],
        }
    }
}

/// 商品抓取引擎特质
///
/// 每个实现代表一种取页方式，按成本从低到高排列在 [`EngineRouter`](crate::engines::router::EngineRouter) 中
#[async_trait]
pub trait ProductFetcher: Send + Sync {
    /// 按搜索词抓取商品
    async fn fetch(&self, query: &str, num_results: usize) -> Result<FetchOutcome, EngineError>;

    /// 单次抓取的硬超时，由路由器强制执行
    fn hard_timeout(&self) -> Duration;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
