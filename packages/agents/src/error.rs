// ABOUTME: Error types for agent adapter steps
// ABOUTME: Sandbox failures and non-zero exits of preparation commands

use kiln_sandbox::{ExecOutput, SandboxError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    /// A preparation command inside the sandbox exited non-zero
    #[error("Failed to {step} (exit code {exit_code}): {stderr}")]
    StepFailed {
        step: &'static str,
        exit_code: i64,
        stderr: String,
    },
}

impl AgentError {
    /// Turn a non-zero exec result into [`AgentError::StepFailed`]
    pub fn check(step: &'static str, output: &ExecOutput) -> Result<()> {
        if output.success() {
            return Ok(());
        }
        Err(AgentError::StepFailed {
            step,
            exit_code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
