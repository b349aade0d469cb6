// ABOUTME: OpenAI Codex CLI adapter
// ABOUTME: Runs `codex exec --json` and accumulates agent messages and token usage

use async_trait::async_trait;
use kiln_core::{constants::OPENAI_API_KEY, shell_quote, Event, ModelProvider};
use kiln_sandbox::{Sandbox, SandboxManager};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::{AgentAdapter, AgentError, AgentResult, Result};

const SYSTEM_PROMPT_PATH: &str = "/workspace/AGENTS.md";

/// Token counters reported on `turn.completed` events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub cached_input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Sum usage across every `turn.completed` event
    pub fn from_events(events: &[Event]) -> Self {
        events
            .iter()
            .filter(|e| e.event_type() == Some("turn.completed"))
            .filter_map(|e| e.get("usage"))
            .filter_map(|usage| serde_json::from_value::<TokenUsage>(usage.clone()).ok())
            .fold(TokenUsage::default(), |acc, u| TokenUsage {
                input_tokens: acc.input_tokens + u.input_tokens,
                cached_input_tokens: acc.cached_input_tokens + u.cached_input_tokens,
                output_tokens: acc.output_tokens + u.output_tokens,
            })
    }
}

/// Message-accumulation protocol: every completed agent message contributes text
#[derive(Debug, Clone)]
pub struct Codex {
    timeout_secs: u64,
}

impl Codex {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

#[async_trait]
impl AgentAdapter for Codex {
    fn provider(&self) -> ModelProvider {
        ModelProvider::Codex
    }

    fn system_prompt_path(&self) -> &'static str {
        SYSTEM_PROMPT_PATH
    }

    fn build_command(&self, user_prompt: &str) -> String {
        format!(
            "timeout --signal=KILL {} codex exec --json \
             --dangerously-bypass-approvals-and-sandbox \
             --skip-git-repo-check {}",
            self.timeout_secs,
            shell_quote(user_prompt)
        )
    }

    async fn login(&self, sandboxes: &dyn SandboxManager, sandbox: &Sandbox) -> Result<()> {
        info!("Logging in to Codex in {}", sandbox.short_id());
        let command = format!("printenv {} | codex login --with-api-key", OPENAI_API_KEY);
        let output = sandboxes.exec(sandbox, &command, None).await?;
        AgentError::check("log in to Codex", &output)
    }

    fn extract_result(&self, events: &[Event]) -> AgentResult {
        let messages: Vec<&str> = events
            .iter()
            .filter(|e| e.event_type() == Some("item.completed"))
            .filter_map(|e| e.get("item"))
            .filter(|item| item.get("type").and_then(Value::as_str) == Some("agent_message"))
            .filter_map(|item| item.get("text").and_then(Value::as_str))
            .collect();

        let usage = TokenUsage::from_events(events);
        info!(
            "Codex result: messages={} input_tokens={} cached_input_tokens={} output_tokens={}",
            messages.len(),
            usage.input_tokens,
            usage.cached_input_tokens,
            usage.output_tokens
        );

        let text = messages.join("\n");
        if text.trim().is_empty() {
            AgentResult::NoOutput
        } else {
            AgentResult::Text(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{sandbox, ScriptedSandbox};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn events(values: Vec<Value>) -> Vec<Event> {
        values.into_iter().map(Event::new).collect()
    }

    #[test]
    fn test_build_command() {
        let command = Codex::new(300).build_command("do 'it'");
        assert_eq!(
            command,
            "timeout --signal=KILL 300 codex exec --json \
             --dangerously-bypass-approvals-and-sandbox \
             --skip-git-repo-check 'do '\\''it'\\'''"
        );
    }

    #[test]
    fn test_single_agent_message() {
        let stream = events(vec![json!({
            "type": "item.completed",
            "item": {"type": "agent_message", "text": "Done."}
        })]);

        assert_eq!(
            Codex::new(600).extract_result(&stream),
            AgentResult::Text("Done.".to_string())
        );
    }

    #[test]
    fn test_messages_joined_in_order() {
        let stream = events(vec![
            json!({"type": "thread.started"}),
            json!({"type": "item.completed", "item": {"type": "agent_message", "text": "Looking around."}}),
            json!({"type": "item.completed", "item": {"type": "command_execution", "command": "ls"}}),
            json!({"type": "item.completed", "item": {"type": "agent_message", "text": "Fixed it."}}),
            json!({"type": "turn.completed", "usage": {"input_tokens": 10, "output_tokens": 5}}),
        ]);

        assert_eq!(
            Codex::new(600).extract_result(&stream),
            AgentResult::Text("Looking around.\nFixed it.".to_string())
        );
    }

    #[test]
    fn test_empty_messages_are_kept_in_position() {
        let stream = events(vec![
            json!({"type": "item.completed", "item": {"type": "agent_message", "text": "a"}}),
            json!({"type": "item.completed", "item": {"type": "agent_message", "text": ""}}),
            json!({"type": "item.completed", "item": {"type": "agent_message", "text": "b"}}),
        ]);

        assert_eq!(
            Codex::new(600).extract_result(&stream),
            AgentResult::Text("a\n\nb".to_string())
        );
    }

    #[test]
    fn test_only_blank_messages_is_no_output() {
        let stream = events(vec![
            json!({"type": "item.completed", "item": {"type": "agent_message", "text": ""}}),
            json!({"type": "item.completed", "item": {"type": "agent_message", "text": "  "}}),
        ]);

        assert_eq!(Codex::new(600).extract_result(&stream), AgentResult::NoOutput);
    }

    #[test]
    fn test_no_agent_message_is_no_output() {
        let stream = events(vec![
            json!({"type": "item.completed", "item": {"type": "reasoning", "text": "hmm"}}),
            json!({"type": "turn.completed", "usage": {"input_tokens": 1}}),
        ]);

        assert_eq!(Codex::new(600).extract_result(&stream), AgentResult::NoOutput);
    }

    #[test]
    fn test_token_usage_sums_turns() {
        let stream = events(vec![
            json!({"type": "turn.completed", "usage": {"input_tokens": 100, "cached_input_tokens": 40, "output_tokens": 7}}),
            json!({"type": "item.completed", "item": {"type": "agent_message", "text": "x"}}),
            json!({"type": "turn.completed", "usage": {"input_tokens": 50, "output_tokens": 3}}),
            json!({"type": "turn.completed"}),
        ]);

        assert_eq!(
            TokenUsage::from_events(&stream),
            TokenUsage {
                input_tokens: 150,
                cached_input_tokens: 40,
                output_tokens: 10,
            }
        );
    }

    #[tokio::test]
    async fn test_login_pipes_api_key() {
        let sandboxes = ScriptedSandbox::default();
        Codex::new(600).login(&sandboxes, &sandbox()).await.unwrap();

        assert_eq!(
            *sandboxes.commands.lock().unwrap(),
            vec!["printenv OPENAI_API_KEY | codex login --with-api-key".to_string()]
        );
    }

    #[tokio::test]
    async fn test_login_failure_aborts() {
        let sandboxes = ScriptedSandbox {
            exit_code: 1,
            ..Default::default()
        };

        let err = Codex::new(600).login(&sandboxes, &sandbox()).await.unwrap_err();
        assert!(matches!(err, AgentError::StepFailed { exit_code: 1, .. }));
    }
}
