// ABOUTME: Error types for job processing
// ABOUTME: Every variant ends the job with an error reply, never the worker

use kiln_agents::AgentError;
use kiln_runs::RunError;
use kiln_sandbox::SandboxError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Run(#[from] RunError),

    #[error("Job targets repo {0} but GH_OWNER is not set")]
    MissingGhOwner(String),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Failed to clone repo {repo}: {detail}")]
    CloneFailed { repo: String, detail: String },

    #[error("Job panicked: {0}")]
    Panicked(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
