// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::recommendation_service::RecommendationService;
use crate::queue::task_queue::SharedReceiver;
use crate::workers::batch_worker::BatchWorker;
use crate::workers::worker::Worker;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
pub struct WorkerManager {
    receiver: SharedReceiver,
    service: Arc<RecommendationService>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerManager {
    pub fn new(receiver: SharedReceiver, service: Arc<RecommendationService>) -> Self {
        Self {
            receiver,
            service,
            handles: Vec::new(),
        }
    }

    /// 启动工作进程
    ///
    /// 创建并启动指定数量的工作进程
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的工作进程数量
    pub fn start_workers(&mut self, count: usize) {
        for id in 0..count {
            let worker = BatchWorker::new(id, self.receiver.clone(), self.service.clone());

            let handle = tokio::spawn(async move {
                if let Err(e) = worker.run().await {
                    error!(worker = worker.name(), "Worker exited with error: {}", e);
                }
            });
            self.handles.push(handle);
        }
        info!(count, "Background workers started");
    }

    /// 正在运行的工作进程数
    pub fn running(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// 关闭所有工作进程
    ///
    /// 正在执行的任务会被中断
    pub async fn shutdown(self) {
        info!("Shutting down workers...");
        for handle in &self.handles {
            handle.abort();
        }
        for handle in self.handles {
            let _ = handle.await;
        }
        info!("Workers shut down successfully");
    }
}
