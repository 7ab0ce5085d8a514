// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含与外部系统交互的实现：
/// - 缓存（cache）：商品列表缓存，Redis 与内存后端
/// - 指标（metrics）：Prometheus 导出器
pub mod cache;
pub mod metrics;
