// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 初始化日志订阅器
///
/// 过滤规则取自 `RUST_LOG`，未设置时使用 `info,outfitrs=debug`
pub fn init_telemetry() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,outfitrs=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
