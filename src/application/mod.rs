// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据传输对象
///
/// HTTP 请求与响应的载荷定义
pub mod dto;
