// ABOUTME: In-process job queue
// ABOUTME: Used for single-process runs and tests where no broker is available

use async_trait::async_trait;
use kiln_core::Job;
use std::collections::VecDeque;
use tokio::sync::{Mutex, Notify};
use tracing::info;

use crate::{JobQueue, Result};

/// FIFO queue held in memory; `dequeue` waits on a notification instead of polling
#[derive(Default)]
pub struct MemoryJobQueue {
    jobs: Mutex<VecDeque<Job>>,
    available: Notify,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn enqueue(&self, job: &Job) -> Result<usize> {
        let depth = {
            let mut jobs = self.jobs.lock().await;
            jobs.push_back(job.clone());
            jobs.len()
        };
        self.available.notify_one();
        info!(run_id = %job.run_id, depth, "Job enqueued");
        Ok(depth)
    }

    async fn dequeue(&self) -> Result<Job> {
        loop {
            if let Some(job) = self.jobs.lock().await.pop_front() {
                return Ok(job);
            }
            self.available.notified().await;
        }
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.jobs.lock().await.len())
    }
}
