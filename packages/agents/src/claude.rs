// ABOUTME: Claude Code CLI adapter
// ABOUTME: Runs `claude -p` with stream-json output and reduces the terminal result marker

use kiln_core::{shell_quote, truncate_chars, Event, ModelProvider};
use serde_json::Value;
use tracing::{debug, info};

use crate::{AgentAdapter, AgentResult};

const SYSTEM_PROMPT_PATH: &str = "/tmp/system-prompt.txt";
const MAX_TURNS: u32 = 50;

const MAX_TURNS_SUBTYPE: &str = "error_max_turns";
const MAX_TURNS_MESSAGE: &str = "Agent stopped after reaching the maximum number of turns.";
const EMPTY_SUMMARY_MESSAGE: &str = "(Agent finished without a summary)";
const DEFAULT_ERROR_TEXT: &str = "Agent encountered an error.";

/// Result-marker protocol: the last `{"type":"result"}` event carries the outcome
#[derive(Debug, Clone)]
pub struct ClaudeCode {
    timeout_secs: u64,
}

impl ClaudeCode {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

#[async_trait::async_trait]
impl AgentAdapter for ClaudeCode {
    fn provider(&self) -> ModelProvider {
        ModelProvider::Claude
    }

    fn system_prompt_path(&self) -> &'static str {
        SYSTEM_PROMPT_PATH
    }

    fn build_command(&self, user_prompt: &str) -> String {
        format!(
            "timeout --signal=KILL {} claude -p {} \
             --output-format stream-json --verbose \
             --dangerously-skip-permissions \
             --max-turns {} \
             --append-system-prompt-file {}",
            self.timeout_secs,
            shell_quote(user_prompt),
            MAX_TURNS,
            SYSTEM_PROMPT_PATH
        )
    }

    fn extract_result(&self, events: &[Event]) -> AgentResult {
        let Some(marker) = events
            .iter()
            .rev()
            .find(|e| e.event_type() == Some("result"))
        else {
            return AgentResult::NoOutput;
        };

        let is_error = marker
            .get("is_error")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let subtype = marker.get("subtype").and_then(Value::as_str).unwrap_or("");
        let cost = marker
            .get("total_cost_usd")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let turns = marker.get("num_turns").and_then(Value::as_u64).unwrap_or(0);
        let text = marker.get("result").and_then(Value::as_str);

        info!(
            "Claude result: is_error={} subtype={} cost=${:.4} turns={}",
            is_error, subtype, cost, turns
        );

        if is_error {
            let error_text = text.unwrap_or(DEFAULT_ERROR_TEXT);
            if subtype == MAX_TURNS_SUBTYPE {
                return AgentResult::Text(format!("{}\n\n{}", MAX_TURNS_MESSAGE, error_text));
            }
            return AgentResult::Text(format!("Agent error: {}", error_text));
        }

        let text = text.unwrap_or("");
        debug!(
            "Claude result text ({} chars): {}",
            text.chars().count(),
            truncate_chars(text, 500)
        );
        if text.is_empty() {
            AgentResult::Text(EMPTY_SUMMARY_MESSAGE.to_string())
        } else {
            AgentResult::Text(text.to_string())
        }
    }
}
