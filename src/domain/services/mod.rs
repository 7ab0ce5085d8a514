// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务
///
/// - 商品搜索服务：单个搜索词的缓存与引擎调度
/// - 推荐服务：推荐批次的遍历与汇总
pub mod product_search_service;
pub mod recommendation_service;
