// ABOUTME: Job queue client for Kiln
// ABOUTME: FIFO enqueue and blocking dequeue over a shared broker

pub mod error;
pub mod memory;
pub mod redis_queue;

pub use error::{QueueError, Result};
pub use memory::MemoryJobQueue;
pub use redis_queue::RedisJobQueue;

use async_trait::async_trait;
use kiln_core::Job;

/// FIFO hand-off of jobs between producers and the worker.
///
/// Delivery is at-least-once from the producer's side and at-most-once once a
/// job has been popped: a worker crash mid-job loses that job.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Fail fast if the broker is unreachable
    async fn ping(&self) -> Result<()>;

    /// Append a job to the tail of the queue, returning the resulting depth
    async fn enqueue(&self, job: &Job) -> Result<usize>;

    /// Block until a job is available and pop it from the head
    async fn dequeue(&self) -> Result<Job>;

    /// Current number of queued jobs
    async fn len(&self) -> Result<usize>;
}
