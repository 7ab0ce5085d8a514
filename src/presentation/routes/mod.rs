// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::recommendation_service::RecommendationService;
use crate::presentation::handlers::product_handler;
use crate::queue::task_queue::BatchQueue;
use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 参数
///
/// * `service` - 推荐批处理服务，同步接口使用
/// * `queue` - 后台任务队列，异步接口使用
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(service: Arc<RecommendationService>, queue: BatchQueue) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/products/references", post(product_handler::references))
        .route(
            "/products/references-scrape",
            post(product_handler::references_scrape),
        )
        .layer(Extension(service))
        .layer(Extension(queue))
        // Browser frontends on any origin call these endpoints directly
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回 `{"status": "ok"}`
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
