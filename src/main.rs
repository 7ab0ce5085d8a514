// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use outfitrs::config::settings::Settings;
use outfitrs::domain::services::product_search_service::ProductSearchService;
use outfitrs::domain::services::recommendation_service::RecommendationService;
use outfitrs::engines::router::EngineRouter;
use outfitrs::infrastructure::cache::cache_manager::CacheHandle;
use outfitrs::infrastructure::metrics;
use outfitrs::presentation::routes;
use outfitrs::queue::task_queue::BatchQueue;
use outfitrs::utils::telemetry;
use outfitrs::workers::manager::WorkerManager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting outfitrs...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    metrics::init_metrics(&settings.metrics);

    // 3. Cache, degrading to disabled when the backend is unavailable
    let cache = CacheHandle::from_settings(&settings).await;

    // 4. Engines and services
    let router = Arc::new(EngineRouter::from_settings(&settings.scraper));
    let search = Arc::new(ProductSearchService::from_settings(&settings, router, cache));
    let service = Arc::new(RecommendationService::new(search));

    // 5. Start Workers
    let (queue, receiver) = BatchQueue::new(settings.workers.queue_capacity);
    let mut worker_manager = WorkerManager::new(receiver, service.clone());
    worker_manager.start_workers(settings.workers.count);

    // 6. Start HTTP server
    let app = routes::routes(service, queue);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    worker_manager.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
    }
}
