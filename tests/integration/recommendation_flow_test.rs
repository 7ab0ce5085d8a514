// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    empty_listing_page, listing_page, mount_listing, recommendation_service, requests_for,
    search_service,
};
use outfitrs::application::dto::recommendation_request::RecommendationRequestDto;
use outfitrs::infrastructure::cache::cache_manager::CacheHandle;
use serde_json::json;
use wiremock::MockServer;

fn request(recommendations: serde_json::Value, gender: Option<&str>) -> RecommendationRequestDto {
    RecommendationRequestDto {
        recommendations: Some(recommendations),
        gender: gender.map(serde_json::Value::from),
    }
}

/// 单个推荐条目端到端得到商品
#[tokio::test]
async fn test_single_item_end_to_end() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "White T-shirt for men",
        listing_page(&[("Cotton Tee", "assets/images/tee.jpg")]),
    )
    .await;

    let service = recommendation_service(&server, CacheHandle::memory());
    let results = service
        .process(&request(
            json!({ "Tops": [{ "Clothing Type": "T-shirt", "Color": "White" }] }),
            Some("men"),
        ))
        .await;

    let tops = &results["Tops"];
    assert_eq!(tops.len(), 1);
    assert_eq!(
        tops[0].recommendation,
        json!({ "Clothing Type": "T-shirt", "Color": "White" })
    );
    assert_eq!(tops[0].products.len(), 1);
    assert_eq!(tops[0].products[0].search_query, "White T-shirt for men");
    assert_eq!(tops[0].products[0].product.name, "Cotton Tee");
    assert_eq!(
        tops[0].products[0].product.image_url,
        "https://assets.myntassets.com/assets/images/tee.jpg"
    );
}

/// 颜色候选分别查询，结果合并到同一条目中
#[tokio::test]
async fn test_color_alternatives_are_merged() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "Blue Jeans for women",
        listing_page(&[
            ("Skinny Fit Jeans", "assets/images/blue-1.jpg"),
            ("Mom Fit Jeans", "assets/images/blue-2.jpg"),
            ("Straight Jeans", "assets/images/blue-3.jpg"),
        ]),
    )
    .await;
    mount_listing(
        &server,
        "Black Jeans for women",
        listing_page(&[("Bootcut Jeans", "https://cdn.example.com/black.jpg")]),
    )
    .await;

    let service = recommendation_service(&server, CacheHandle::memory());
    let results = service
        .process(&request(
            json!({ "Bottoms": [{ "Clothing Type": "Jeans", "Color": "Blue or Black" }] }),
            Some("women"),
        ))
        .await;

    let products = &results["Bottoms"][0].products;
    let queries: Vec<&str> = products.iter().map(|m| m.search_query.as_str()).collect();
    assert_eq!(
        queries,
        vec![
            "Blue Jeans for women",
            "Blue Jeans for women",
            "Black Jeans for women"
        ]
    );
    assert_eq!(products[2].product.image_url, "https://cdn.example.com/black.jpg");
}

/// 无结果、缺字段的条目被丢弃，分类键仍然保留
#[tokio::test]
async fn test_items_without_products_are_dropped() {
    let server = MockServer::start().await;
    mount_listing(&server, "Red Scarf for unisex", empty_listing_page()).await;

    let service = recommendation_service(&server, CacheHandle::memory());
    let results = service
        .process(&request(
            json!({
                "Accessories": [
                    { "Clothing Type": "Scarf", "Color": "Red" },
                    { "Clothing Type": "Belt" }
                ]
            }),
            None,
        ))
        .await;

    assert!(results.contains_key("Accessories"));
    assert!(results["Accessories"].is_empty());
    assert_eq!(requests_for(&server, "Red Scarf for unisex").await, 1);
}

/// 同一搜索词只抓取一次，包括空结果
#[tokio::test]
async fn test_repeated_query_is_served_from_cache() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "White T-shirt for men",
        listing_page(&[("Cotton Tee", "assets/images/tee.jpg")]),
    )
    .await;
    mount_listing(&server, "Green Cap for men", empty_listing_page()).await;

    let cache = CacheHandle::memory();
    let search = search_service(&server, cache.clone());

    for _ in 0..3 {
        assert_eq!(search.find_products("White T-shirt for men").await.len(), 1);
        assert!(search.find_products("Green Cap for men").await.is_empty());
    }

    assert_eq!(requests_for(&server, "White T-shirt for men").await, 1);
    assert_eq!(requests_for(&server, "Green Cap for men").await, 1);
    assert_eq!(cache.get("myntra:Green Cap for men").await, Some(Vec::new()));
}

/// 站点拦截时不写缓存，下次重新抓取
#[tokio::test]
async fn test_blocked_query_is_not_cached() {
    let server = MockServer::start().await;
    let blocked = format!(
        "<html><head><title>Myntra</title></head><body>Access Denied{}</body></html>",
        " ".repeat(2000)
    );
    mount_listing(&server, "Black Jacket for men", blocked).await;

    let cache = CacheHandle::memory();
    let search = search_service(&server, cache.clone());

    assert!(search.find_products("Black Jacket for men").await.is_empty());
    assert!(search.find_products("Black Jacket for men").await.is_empty());

    assert_eq!(requests_for(&server, "Black Jacket for men").await, 2);
    assert_eq!(cache.get("myntra:Black Jacket for men").await, None);
}

/// 缓存不可用时照常抓取
#[tokio::test]
async fn test_disabled_cache_fetches_every_time() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "White T-shirt for men",
        listing_page(&[("Cotton Tee", "assets/images/tee.jpg")]),
    )
    .await;

    let search = search_service(&server, CacheHandle::Disabled);
    assert_eq!(search.find_products("White T-shirt for men").await.len(), 1);
    assert_eq!(search.find_products("White T-shirt for men").await.len(), 1);
    assert_eq!(requests_for(&server, "White T-shirt for men").await, 2);
}
