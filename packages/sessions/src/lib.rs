// ABOUTME: Session recording for Kiln
// ABOUTME: One immutable JSONL file per job: metadata header followed by events

pub mod file;

pub use file::FileSessionRecorder;

use async_trait::async_trait;
use kiln_core::Event;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Session metadata must be a JSON object")]
    InvalidMetadata,
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Persists the raw event stream of a job, independent of run reporting
#[async_trait]
pub trait SessionRecorder: Send + Sync {
    /// Write one session artifact and return where it was stored
    async fn save(&self, label: &str, metadata: &Value, events: &[Event]) -> Result<PathBuf>;
}
