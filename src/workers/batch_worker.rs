// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::recommendation_service::RecommendationService;
use crate::queue::task_queue::{BatchJob, SharedReceiver};
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;
use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use tracing::{error, info};

/// 推荐批处理工作器
///
/// 从共享队列中取任务执行，结果只记录在日志中
pub struct BatchWorker {
    name: String,
    receiver: SharedReceiver,
    service: Arc<RecommendationService>,
}

impl BatchWorker {
    pub fn new(id: usize, receiver: SharedReceiver, service: Arc<RecommendationService>) -> Self {
        Self {
            name: format!("batch-worker-{}", id),
            receiver,
            service,
        }
    }

    /// 执行单个任务
    ///
    /// 任务在独立的 task 中运行，其中的 panic 不会终止工作器
    async fn process_job(&self, job: BatchJob) -> Result<(), WorkerError> {
        let service = self.service.clone();
        let job_id = job.id;
        let queued_ms = (Utc::now() - job.submitted_at).num_milliseconds();

        info!(worker = %self.name, %job_id, queued_ms, "Processing batch job");

        let results = tokio::spawn(async move { service.process(&job.request).await })
            .await
            .map_err(|e| WorkerError::JobAborted(e.to_string()))?;

        info!(
            worker = %self.name,
            %job_id,
            categories = results.len(),
            items = results.values().map(Vec::len).sum::<usize>(),
            "Batch job finished"
        );
        Ok(())
    }
}

#[async_trait]
impl Worker for BatchWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        info!(worker = %self.name, "Worker started");

        loop {
            // Hold the lock only while waiting for the next job
            let job = { self.receiver.lock().await.recv().await };
            let Some(job) = job else {
                info!(worker = %self.name, "Queue closed, worker stopping");
                return Ok(());
            };

            let job_id = job.id;
            match self.process_job(job).await {
                Ok(()) => counter!("batch_jobs_total", "outcome" => "completed").increment(1),
                Err(e) => {
                    counter!("batch_jobs_total", "outcome" => "failed").increment(1);
                    error!(worker = %self.name, %job_id, "Batch job failed: {}", e);
                }
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
