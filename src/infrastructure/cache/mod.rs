// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 缓存模块
///
/// 提供商品列表缓存，支持 Redis 与内存两种后端
pub mod cache_manager;
pub mod cache_strategy;
pub mod redis_client;
