// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{listing_page, mount_listing, recommendation_service, requests_for};
use outfitrs::application::dto::recommendation_request::RecommendationRequestDto;
use outfitrs::infrastructure::cache::cache_manager::CacheHandle;
use outfitrs::queue::task_queue::BatchQueue;
use outfitrs::workers::manager::WorkerManager;
use serde_json::json;
use std::time::Duration;
use wiremock::MockServer;

fn batch(clothing_type: &str, color: &str) -> RecommendationRequestDto {
    RecommendationRequestDto {
        recommendations: Some(json!({
            "Items": [{ "Clothing Type": clothing_type, "Color": color }]
        })),
        gender: Some(json!("men")),
    }
}

/// 等待直到条件满足，最多约 5 秒
async fn wait_until<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

/// 工作器消费队列中的所有任务
#[tokio::test]
async fn test_workers_drain_queued_batches() {
    let server = MockServer::start().await;
    let queries = [
        "White T-shirt for men",
        "Black Jeans for men",
        "Brown Boots for men",
    ];
    for query in queries {
        mount_listing(&server, query, listing_page(&[("Item", "assets/images/item.jpg")])).await;
    }

    let service = recommendation_service(&server, CacheHandle::memory());
    let (queue, receiver) = BatchQueue::new(8);
    let mut manager = WorkerManager::new(receiver, service);
    manager.start_workers(2);
    assert_eq!(manager.running(), 2);

    queue.submit(batch("T-shirt", "White")).unwrap();
    queue.submit(batch("Jeans", "Black")).unwrap();
    queue.submit(batch("Boots", "Brown")).unwrap();

    let server_ref = &server;
    let all_fetched = wait_until(move || async move {
        let mut done = true;
        for query in queries {
            done &= requests_for(server_ref, query).await == 1;
        }
        done
    })
    .await;
    assert!(all_fetched, "workers did not process every batch");

    manager.shutdown().await;
}

/// 发送端全部释放后工作器自行退出
#[tokio::test]
async fn test_workers_stop_when_queue_closes() {
    let server = MockServer::start().await;
    let service = recommendation_service(&server, CacheHandle::memory());
    let (queue, receiver) = BatchQueue::new(4);
    let mut manager = WorkerManager::new(receiver, service);
    manager.start_workers(3);

    drop(queue);

    let manager_ref = &manager;
    let stopped = wait_until(move || async move { manager_ref.running() == 0 }).await;
    assert!(stopped, "workers kept running after the queue closed");
    manager.shutdown().await;
}

/// 关闭时中断仍在等待任务的工作器
#[tokio::test]
async fn test_shutdown_aborts_idle_workers() {
    let server = MockServer::start().await;
    let service = recommendation_service(&server, CacheHandle::memory());
    let (queue, receiver) = BatchQueue::new(4);
    let mut manager = WorkerManager::new(receiver, service);
    manager.start_workers(2);

    tokio::time::timeout(Duration::from_secs(5), manager.shutdown())
        .await
        .expect("shutdown hung");

    assert!(queue.submit(RecommendationRequestDto::default()).is_err());
}
