// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 初始化指标系统
///
/// 未启用时不安装导出器，`metrics` 宏在没有记录器时为空操作
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", settings.listen_addr, e);
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_counter!("engine_attempts_total", "Fetch attempts per engine");
    describe_counter!("engine_hits_total", "Fetches that produced products, per engine");
    describe_counter!("engine_rejections_total", "Pages rejected by the classifier, per engine and verdict");
    describe_counter!("engine_errors_total", "Transport failures and timeouts, per engine");
    describe_histogram!("engine_duration_seconds", "Duration of a single engine fetch in seconds");
    describe_counter!("product_cache_hits_total", "Queries answered from cache");
    describe_counter!("product_cache_misses_total", "Queries that required fetching");
    describe_counter!("product_cache_evictions_total", "Entries dropped from the in-memory cache");
    describe_gauge!("product_cache_entries", "Entries held by the in-memory cache");
    describe_counter!("batch_jobs_total", "Background batch jobs, by outcome");

    info!("Metrics exporter listening on {}", addr);
}
