// ABOUTME: Metadata sent to the run tracker when a run is created
// ABOUTME: Built by producers before a job is enqueued

use serde::{Deserialize, Serialize};

/// Description of a run, registered before the job is enqueued
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub trigger_user_name: String,
    pub source: String,
    pub thread_context: String,
    pub repo: Option<String>,
    pub channel_id: Option<String>,
    pub thread_ts: Option<String>,
}

impl RunMetadata {
    /// Metadata for a job submitted from the command line
    pub fn cli(trigger_user_name: &str, prompt: &str, repo: Option<&str>) -> Self {
        Self {
            trigger_user_name: trigger_user_name.to_string(),
            source: "cli".to_string(),
            thread_context: prompt.to_string(),
            repo: repo.map(str::to_string),
            channel_id: None,
            thread_ts: None,
        }
    }
}
