// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use rand::Rng;
use std::net::TcpListener;
use thiserror::Error;
use tracing::debug;

/// 浏览器调试端口的候选范围
pub const DEBUG_PORT_RANGE: std::ops::Range<u16> = 9300..9900;

/// 单次嗅探最多尝试的端口数
const MAX_ATTEMPTS: u16 = 100;

/// 端口嗅探错误类型
#[derive(Error, Debug)]
pub enum PortSnifferError {
    #[error("未找到可用端口: {0}")]
    NoAvailablePort(String),
}

/// 端口嗅探器
pub struct PortSniffer;

impl PortSniffer {
    /// 检查指定端口是否已被占用
    pub fn is_port_in_use(port: u16) -> bool {
        TcpListener::bind(("127.0.0.1", port)).is_err()
    }

    /// 从 `start_port` 开始向后查找第一个空闲端口
    ///
    /// # 参数
    ///
    /// * `start_port` - 起始端口号
    ///
    /// # 返回值
    ///
    /// * `Ok(u16)` - 空闲端口
    /// * `Err(PortSnifferError)` - 在尝试范围内没有空闲端口
    pub fn find_available_port(start_port: u16) -> Result<u16, PortSnifferError> {
        let max_port = start_port.saturating_add(MAX_ATTEMPTS);

        for port in start_port..=max_port {
            if !Self::is_port_in_use(port) {
                return Ok(port);
            }
            debug!("Port {} is in use, trying next", port);
        }

        Err(PortSnifferError::NoAvailablePort(format!(
            "在范围 {}-{} 内未找到可用端口",
            start_port, max_port
        )))
    }

    /// 为一次浏览器启动挑选调试端口
    ///
    /// 起点在 [`DEBUG_PORT_RANGE`] 内随机选取，降低并发启动时撞到同一端口的概率
    pub fn pick_debugging_port() -> Result<u16, PortSnifferError> {
        let start = rand::rng().random_range(DEBUG_PORT_RANGE);
        Self::find_available_port(start)
    }
}
