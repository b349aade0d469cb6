// ABOUTME: Sandbox lifecycle management for agent runs
// ABOUTME: Provision, exec, and guaranteed teardown of one isolated container per job

pub mod credentials;
pub mod docker;
pub mod error;
pub mod lease;
pub mod types;

pub use credentials::Credentials;
pub use docker::DockerSandboxManager;
pub use error::{Result, SandboxError};
pub use lease::SandboxLease;
pub use types::{ExecOutput, ResourceLimits, Sandbox};

use async_trait::async_trait;
use kiln_core::ModelProvider;

/// Owner of the isolated-execution-environment lifecycle
#[async_trait]
pub trait SandboxManager: Send + Sync {
    /// Start a fresh sandbox with the credentials `provider` needs.
    ///
    /// Fails before anything is created when a required credential is missing.
    async fn provision(&self, provider: ModelProvider, run_id: &str) -> Result<Sandbox>;

    /// Run `command` through `sh -c` inside the sandbox and capture both streams in full
    async fn exec(&self, sandbox: &Sandbox, command: &str, workdir: Option<&str>)
        -> Result<ExecOutput>;

    /// Stop and remove the sandbox. Failures are logged, never returned.
    async fn destroy(&self, sandbox: &Sandbox);
}
