// ABOUTME: Error types for the job queue
// ABOUTME: Broker connectivity and payload decoding failures

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    /// Broker command or connection failure
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Payload could not be encoded or decoded
    #[error("Invalid job payload: {0}")]
    Payload(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QueueError>;
