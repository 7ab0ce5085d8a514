// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::recommendation_request::RecommendationRequestDto;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// 队列错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueueError {
    /// 队列已满
    #[error("后台队列已满，请稍后重试")]
    Full,

    /// 队列已关闭
    #[error("后台队列已关闭")]
    Closed,
}

/// 后台推荐批处理任务
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// 任务ID
    pub id: Uuid,
    /// 推荐请求
    pub request: RecommendationRequestDto,
    /// 提交时间
    pub submitted_at: DateTime<Utc>,
}

impl BatchJob {
    pub fn new(request: RecommendationRequestDto) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            submitted_at: Utc::now(),
        }
    }
}

/// 多个工作器共享的接收端
pub type SharedReceiver = Arc<Mutex<mpsc::Receiver<BatchJob>>>;

/// 有界的进程内任务队列
#[derive(Clone)]
pub struct BatchQueue {
    sender: mpsc::Sender<BatchJob>,
}

impl BatchQueue {
    /// 创建队列
    ///
    /// # 参数
    ///
    /// * `capacity` - 队列容量，为 0 时按 1 处理
    ///
    /// # 返回值
    ///
    /// 队列与供工作器共享的接收端
    pub fn new(capacity: usize) -> (Self, SharedReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, Arc::new(Mutex::new(receiver)))
    }

    /// 提交任务，不等待
    ///
    /// # 返回值
    ///
    /// * `Ok(Uuid)` - 任务ID
    /// * `Err(QueueError::Full)` - 队列已满
    /// * `Err(QueueError::Closed)` - 所有接收端已释放
    pub fn submit(&self, request: RecommendationRequestDto) -> Result<Uuid, QueueError> {
        let job = BatchJob::new(request);
        let id = job.id;

        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })?;

        debug!(job_id = %id, "Batch job queued");
        Ok(id)
    }

    /// 当前剩余容量
    pub fn remaining_capacity(&self) -> usize {
        self.sender.capacity()
    }
}
