// ABOUTME: Worker loop consuming the job queue
// ABOUTME: Dequeues one job at a time and hands it to the engine until shut down between jobs

use kiln_core::Job;
use kiln_queue::{JobQueue, QueueError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::{Engine, JobOutcome};

/// Pause after a broker error before trying to dequeue again
const DEQUEUE_BACKOFF: Duration = Duration::from_secs(5);

pub struct Worker {
    queue: Arc<dyn JobQueue>,
    engine: Engine,
}

impl Worker {
    pub fn new(queue: Arc<dyn JobQueue>, engine: Engine) -> Self {
        Self { queue, engine }
    }

    /// Wait for the next job and process it
    pub async fn run_once(&self) -> Result<JobOutcome, QueueError> {
        let job = self.next_job().await?;
        Ok(self.engine.process_job(&job).await)
    }

    async fn next_job(&self) -> Result<Job, QueueError> {
        let job = self.queue.dequeue().await?;
        match self.queue.len().await {
            Ok(remaining) => info!(
                run_id = %job.run_id,
                "Job received | Remaining in queue: {}",
                remaining
            ),
            Err(e) => warn!("Job received | Could not read queue length: {}", e),
        }
        Ok(job)
    }

    /// Process jobs until `shutdown` resolves.
    ///
    /// Shutdown is only honoured while waiting for a job or backing off. A
    /// popped job always runs to completion, so its sandbox is destroyed and
    /// its requester answered before this returns.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        match self.queue.len().await {
            Ok(len) => info!("Current queue length: {}", len),
            Err(e) => warn!("Could not read queue length: {}", e),
        }
        info!("Waiting for jobs...");

        tokio::pin!(shutdown);
        loop {
            let next = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                next = self.next_job() => next,
            };

            match next {
                Ok(job) => {
                    self.engine.process_job(&job).await;
                }
                Err(QueueError::Payload(e)) => {
                    error!("Skipping job with invalid payload: {}", e);
                }
                Err(e) => {
                    error!("Failed to dequeue job: {}", e);
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(DEQUEUE_BACKOFF) => {}
                    }
                }
            }
        }

        info!("Worker stopped");
    }
}
