// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;

use crate::{
    application::dto::recommendation_request::{BatchAcceptedDto, RecommendationRequestDto},
    domain::{
        models::product::CategoryResults,
        services::recommendation_service::RecommendationService,
    },
    presentation::errors::AppError,
    queue::task_queue::BatchQueue,
};

/// 同步查找推荐商品
///
/// 在请求任务中处理整个批次，返回按分类汇总的结果
pub async fn references(
    Extension(service): Extension<Arc<RecommendationService>>,
    payload: Result<Json<RecommendationRequestDto>, JsonRejection>,
) -> Result<Json<CategoryResults>, AppError> {
    let Json(request) = payload?;
    let results = service.process(&request).await;
    Ok(Json(results))
}

/// 提交后台推荐任务
///
/// 立即返回 202 和任务ID，队列已满时返回 503
pub async fn references_scrape(
    Extension(queue): Extension<BatchQueue>,
    payload: Result<Json<RecommendationRequestDto>, JsonRejection>,
) -> Result<(StatusCode, Json<BatchAcceptedDto>), AppError> {
    let Json(request) = payload?;
    let job_id = queue.submit(request)?;

    info!(
        %job_id,
        remaining_capacity = queue.remaining_capacity(),
        "Recommendation batch accepted"
    );
    Ok((StatusCode::ACCEPTED, Json(BatchAcceptedDto::new(job_id))))
}
