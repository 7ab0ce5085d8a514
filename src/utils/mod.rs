// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
/// 包括文本解码、地址处理、端口探测和日志初始化
pub mod errors;
pub mod port_sniffer;
pub mod telemetry;
pub mod text_processing;
pub mod url_utils;
