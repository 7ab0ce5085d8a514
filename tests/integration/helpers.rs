// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use outfitrs::config::settings::Settings;
use outfitrs::domain::services::product_search_service::ProductSearchService;
use outfitrs::domain::services::recommendation_service::RecommendationService;
use outfitrs::engines::reqwest_engine::ReqwestEngine;
use outfitrs::engines::router::EngineRouter;
use outfitrs::engines::traits::ProductFetcher;
use outfitrs::infrastructure::cache::cache_manager::CacheHandle;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 构造带商品卡片的搜索结果页
pub fn listing_page(products: &[(&str, &str)]) -> String {
    let cards: String = products
        .iter()
        .map(|(name, image)| {
            format!(
                r#"<li class="product-base"><a href="/p"><picture><img class="img-responsive" src="{}" alt=""></picture><div class="product-productMetaInfo"><h3 class="product-brand">Roadster</h3><h4 class="product-product">{}</h4></div></a></li>"#,
                image, name
            )
        })
        .collect();

    format!(
        "<html><head><title>Buy Online | Myntra</title></head><body>{}<ul class=\"results-base\">{}</ul></body></html>",
        "<div class=\"desktop-nav\">myntra fashion store navigation</div>".repeat(30),
        cards
    )
}

/// 一个没有任何商品卡片、但足够长的搜索结果页
pub fn empty_listing_page() -> String {
    listing_page(&[])
}

/// 为某个搜索词挂载一个结果页
pub async fn mount_listing(server: &MockServer, query: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", query.replace(' ', "-"))))
        .and(query_param("rawQuery", query))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// 统计发往某个搜索词的请求数
pub async fn requests_for(server: &MockServer, query: &str) -> usize {
    let expected = format!("/{}", query.replace(' ', "-"));
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == expected)
        .count()
}

/// 只使用直连 HTTP 引擎、指向模拟站点的搜索服务
pub fn search_service(server: &MockServer, cache: CacheHandle) -> Arc<ProductSearchService> {
    let settings = Settings::with_defaults().unwrap();
    let engine = ReqwestEngine::new(&settings.scraper)
        .with_base_url(server.uri())
        .with_timeout(Duration::from_secs(5));
    let router = EngineRouter::new(vec![Arc::new(engine) as Arc<dyn ProductFetcher>]);

    Arc::new(ProductSearchService::from_settings(
        &settings,
        Arc::new(router),
        cache,
    ))
}

pub fn recommendation_service(server: &MockServer, cache: CacheHandle) -> Arc<RecommendationService> {
    Arc::new(RecommendationService::new(search_service(server, cache)))
}
