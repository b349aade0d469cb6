// ABOUTME: Provider protocol adapters for coding agents
// ABOUTME: One adapter per model provider behind a shared command/stream interface

pub mod claude;
pub mod codex;
pub mod error;
pub mod stream;

pub use claude::ClaudeCode;
pub use codex::{Codex, TokenUsage};
pub use error::{AgentError, Result};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use kiln_core::{Event, ModelProvider};
use kiln_sandbox::{Sandbox, SandboxManager};
use tracing::debug;

/// Result text when the agent emitted nothing usable
pub const NO_OUTPUT_MESSAGE: &str = "Agent produced no output.";

/// Outcome of reducing an event stream to a single result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentResult {
    /// The stream carried a result
    Text(String),
    /// The stream carried no result for this provider
    NoOutput,
}

impl AgentResult {
    pub fn into_text(self) -> String {
        match self {
            AgentResult::Text(text) => text,
            AgentResult::NoOutput => NO_OUTPUT_MESSAGE.to_string(),
        }
    }
}

/// Interface every supported agent implementation provides.
///
/// The engine only talks to this trait; adding a provider means adding an
/// implementation and a branch in [`adapter_for`].
#[async_trait]
pub trait AgentAdapter: Send + Sync {
    fn provider(&self) -> ModelProvider;

    /// Where the provider picks up its system prompt inside the sandbox
    fn system_prompt_path(&self) -> &'static str;

    /// Non-interactive invocation, hard-wrapped in a SIGKILL wall-clock timeout
    fn build_command(&self, user_prompt: &str) -> String;

    /// Persist the system prompt at [`AgentAdapter::system_prompt_path`]
    async fn write_system_prompt(
        &self,
        sandboxes: &dyn SandboxManager,
        sandbox: &Sandbox,
        prompt: &str,
    ) -> Result<()> {
        let path = self.system_prompt_path();
        debug!("Writing system prompt ({} chars) to {}", prompt.len(), path);
        let output = sandboxes
            .exec(sandbox, &write_file_command(path, prompt), None)
            .await?;
        AgentError::check("write system prompt", &output)
    }

    /// Authenticate inside the sandbox before execution. Most providers need nothing.
    async fn login(&self, _sandboxes: &dyn SandboxManager, _sandbox: &Sandbox) -> Result<()> {
        Ok(())
    }

    fn parse_stream(&self, raw: &str) -> Vec<Event> {
        stream::parse_ndjson(raw)
    }

    fn extract_result(&self, events: &[Event]) -> AgentResult;
}

/// Adapter for `provider`, killing the agent after `timeout_secs`
pub fn adapter_for(provider: ModelProvider, timeout_secs: u64) -> Box<dyn AgentAdapter> {
    match provider {
        ModelProvider::Claude => Box::new(ClaudeCode::new(timeout_secs)),
        ModelProvider::Codex => Box::new(Codex::new(timeout_secs)),
    }
}

/// Shell command that writes `content` to `path` byte-for-byte.
///
/// Base64 keeps quotes and newlines in the content away from the shell.
pub fn write_file_command(path: &str, content: &str) -> String {
    format!(
        "echo {} | base64 -d > {}",
        STANDARD.encode(content),
        kiln_core::shell_quote(path)
    )
}
