// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{listing_page, mount_listing, recommendation_service};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use outfitrs::application::dto::recommendation_request::RecommendationRequestDto;
use outfitrs::infrastructure::cache::cache_manager::CacheHandle;
use outfitrs::presentation::routes;
use outfitrs::queue::task_queue::{BatchQueue, SharedReceiver};
use serde_json::{json, Value};
use tower::util::ServiceExt;
use wiremock::MockServer;

async fn app(server: &MockServer, queue_capacity: usize) -> (Router, BatchQueue, SharedReceiver) {
    let service = recommendation_service(server, CacheHandle::memory());
    let (queue, receiver) = BatchQueue::new(queue_capacity);
    (routes::routes(service, queue.clone()), queue, receiver)
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// 健康检查测试
#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    let (app, _queue, _receiver) = app(&server, 4).await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

/// 同步接口返回按分类组织的结果
#[tokio::test]
async fn test_references_returns_category_results() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "White T-shirt for men",
        listing_page(&[("Cotton Tee", "assets/images/tee.jpg")]),
    )
    .await;
    let (app, _queue, _receiver) = app(&server, 4).await;

    let payload = json!({
        "recommendations": {
            "Tops": [{ "Clothing Type": "T-shirt", "Color": "White" }],
            "Footwear": "not a list"
        },
        "gender": "men"
    });
    let response = app
        .oneshot(post_json("/products/references", payload.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body,
        json!({
            "Tops": [{
                "recommendation": { "Clothing Type": "T-shirt", "Color": "White" },
                "products": [{
                    "search_query": "White T-shirt for men",
                    "product": {
                        "name": "Cotton Tee",
                        "image_url": "https://assets.myntassets.com/assets/images/tee.jpg"
                    }
                }]
            }]
        })
    );
}

/// 缺少 recommendations 时返回空对象
#[tokio::test]
async fn test_references_without_recommendations_is_empty() {
    let server = MockServer::start().await;
    let (app, _queue, _receiver) = app(&server, 4).await;

    let response = app
        .oneshot(post_json("/products/references", "{}".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({}));
}

/// 非法 JSON 返回 400
#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let server = MockServer::start().await;
    let (app, _queue, _receiver) = app(&server, 4).await;

    let response = app
        .clone()
        .oneshot(post_json("/products/references", "{not json".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await.get("error").is_some());

    let response = app
        .oneshot(post_json("/products/references-scrape", "[1, 2".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// 异步接口立即返回任务编号
#[tokio::test]
async fn test_references_scrape_accepts_batch() {
    let server = MockServer::start().await;
    let (app, _queue, receiver) = app(&server, 4).await;

    let payload = json!({
        "recommendations": { "Tops": [{ "Clothing Type": "Shirt", "Color": "Blue" }] },
        "gender": "women"
    });
    let response = app
        .oneshot(post_json("/products/references-scrape", payload.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert!(body["message"].as_str().is_some());
    let job_id = body["job_id"].as_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&job_id).is_ok());

    let job = receiver.lock().await.try_recv().unwrap();
    assert_eq!(job.id.to_string(), job_id);
    assert_eq!(job.request.gender(), "women");
}

/// 队列已满时返回 503
#[tokio::test]
async fn test_full_queue_is_service_unavailable() {
    let server = MockServer::start().await;
    let (app, queue, _receiver) = app(&server, 1).await;
    queue.submit(RecommendationRequestDto::default()).unwrap();

    let response = app
        .oneshot(post_json(
            "/products/references-scrape",
            json!({ "recommendations": {} }).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(body_json(response).await["error"].as_str().is_some());
}

/// 跨域请求返回允许任意来源的响应头
#[tokio::test]
async fn test_cors_allows_any_origin() {
    let server = MockServer::start().await;
    let (app, _queue, _receiver) = app(&server, 4).await;

    let mut request = post_json("/products/references", json!({ "recommendations": {} }).to_string());
    request
        .headers_mut()
        .insert(header::ORIGIN, "http://localhost:3000".parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );

    let preflight = Request::builder()
        .method("OPTIONS")
        .uri("/products/references-scrape")
        .header(header::ORIGIN, "https://stylist.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(preflight).await.unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

/// 响应中的分类顺序与请求一致
#[tokio::test]
async fn test_references_keeps_category_order() {
    let server = MockServer::start().await;
    let (app, _queue, _receiver) = app(&server, 4).await;

    let body = r#"{"recommendations":{"Tops":[],"Bottoms":[],"Accessories":[]},"gender":"men"}"#;
    let response = app
        .oneshot(post_json("/products/references", body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(
        std::str::from_utf8(&bytes).unwrap(),
        r#"{"Tops":[],"Bottoms":[],"Accessories":[]}"#
    );
}
