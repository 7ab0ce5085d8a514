// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::recommendation_request::RecommendationRequestDto;
use crate::domain::models::product::{CategoryResults, ItemResult};
use crate::domain::models::recommendation::RecommendationItem;
use crate::domain::services::product_search_service::ProductSearchService;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// 推荐批处理服务
///
/// 遍历 `{分类: [条目]}` 结构，为每个颜色候选生成搜索词并查找商品，
/// 按分类汇总。任何单个条目或搜索词的失败都不会中断整批处理
pub struct RecommendationService {
    search: Arc<ProductSearchService>,
}

impl RecommendationService {
    pub fn new(search: Arc<ProductSearchService>) -> Self {
        Self { search }
    }

    /// 处理一批推荐
    ///
    /// # 参数
    ///
    /// * `request` - 推荐请求
    ///
    /// # 返回值
    ///
    /// 分类结果；`recommendations` 缺失或不是对象时为空映射
    pub async fn process(&self, request: &RecommendationRequestDto) -> CategoryResults {
        let mut results = CategoryResults::new();

        let Some(Value::Object(categories)) = &request.recommendations else {
            warn!("Request has no recommendations object, returning empty result");
            return results;
        };

        let gender = request.gender();
        let start = Instant::now();

        for (category, items) in categories {
            let Value::Array(items) = items else {
                warn!(category = %category, "Category value is not a list, skipping");
                continue;
            };

            let mut category_results = Vec::new();
            for raw_item in items {
                if let Some(item_result) = self.process_item(category, raw_item, &gender).await {
                    category_results.push(item_result);
                }
            }
            results.insert(category.clone(), category_results);
        }

        info!(
            categories = results.len(),
            items = results.values().map(Vec::len).sum::<usize>(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Recommendation batch processed"
        );
        results
    }

    async fn process_item(&self, category: &str, raw_item: &Value, gender: &str) -> Option<ItemResult> {
        let Some(item) = RecommendationItem::from_value(raw_item) else {
            warn!(category, "Skipping recommendation without Clothing Type or Color");
            return None;
        };

        let mut item_result = ItemResult::new(raw_item.clone());
        for color in item.color_alternatives() {
            let query = item.search_query(&color, gender);
            let products = self.search.find_products(&query).await;
            debug!(category, query = %query, count = products.len(), "Query finished");
            item_result.extend(&query, products);
        }

        if item_result.is_empty() {
            debug!(category, clothing_type = %item.clothing_type, "No products for item, dropping it");
            return None;
        }
        Some(item_result)
    }
}

#[cfg(test)]
#[path = "recommendation_service_test.rs"]
mod tests;
